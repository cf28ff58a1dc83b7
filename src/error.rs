//! Error types for the cotizador library.
//!
//! Failures come in two weights:
//!
//! * [`CotizadorError`] — **Fatal**: the evaluation cannot even start
//!   (invalid configuration, extraction provider not configured). Only the
//!   orchestrator's own setup returns it.
//!
//! * Stage errors ([`RequestError`], [`DiscoveryError`], [`OfferError`]) —
//!   **Non-fatal**: a stage or a single offer document failed. They are
//!   returned as `Err` from the stage functions and folded into
//!   [`crate::state::EvaluationState`] by the orchestrator, which keeps
//!   running the remaining stages.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors returned by the cotizador library.
#[derive(Debug, Error)]
pub enum CotizadorError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The LLM provider for the extraction oracle is not initialised
    /// (missing API key, unknown provider name).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// A fixture dataset could not be loaded.
    #[error("Failed to load fixture dataset '{path}': {detail}")]
    FixtureLoad { path: PathBuf, detail: String },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The procurement-request document could not be read.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("No se encontró el archivo {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Error al leer el archivo {}: {detail}", path.display())]
    Unreadable { path: PathBuf, detail: String },
}

/// The offers directory could not be listed.
#[derive(Debug, Error)]
#[error("Cannot list offers directory '{}': {source}", dir.display())]
pub struct DiscoveryError {
    pub dir: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// A single offer document was skipped.
///
/// Never aborts the offers stage; the remaining documents are still
/// processed.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum OfferError {
    /// I/O or UTF-8 decoding failure.
    #[error("{archivo}: unreadable: {detail}")]
    Unreadable { archivo: String, detail: String },

    /// The oracle call failed after all retries.
    #[error("{archivo}: extraction failed after {retries} retries: {detail}")]
    OracleFailed {
        archivo: String,
        retries: u32,
        detail: String,
    },

    /// The oracle call exceeded the configured timeout.
    #[error("{archivo}: extraction timed out after {secs}s")]
    Timeout { archivo: String, secs: u64 },

    /// The oracle response is not a JSON bidder record.
    #[error("{archivo}: malformed extraction result: {detail}")]
    MalformedJson { archivo: String, detail: String },

    /// The record parsed but has no usable numeric `monto_total`.
    #[error("{archivo}: missing or non-numeric monto_total")]
    MissingTotal { archivo: String },

    /// The fixture dataset has no record for this document.
    #[error("{archivo}: no fixture record")]
    NoFixture { archivo: String },
}

impl OfferError {
    /// Source document of the failure.
    pub fn archivo(&self) -> &str {
        match self {
            OfferError::Unreadable { archivo, .. }
            | OfferError::OracleFailed { archivo, .. }
            | OfferError::Timeout { archivo, .. }
            | OfferError::MalformedJson { archivo, .. }
            | OfferError::MissingTotal { archivo }
            | OfferError::NoFixture { archivo } => archivo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_not_found_mentions_path() {
        let e = RequestError::NotFound {
            path: PathBuf::from("emails/solicitud-cotizacion.html"),
        };
        assert!(e.to_string().contains("solicitud-cotizacion.html"), "got: {e}");
    }

    #[test]
    fn offer_timeout_display() {
        let e = OfferError::Timeout {
            archivo: "cotizacion002.html".into(),
            secs: 60,
        };
        let msg = e.to_string();
        assert!(msg.contains("cotizacion002.html"));
        assert!(msg.contains("60s"));
    }

    #[test]
    fn offer_error_archivo_accessor() {
        let e = OfferError::MissingTotal {
            archivo: "cotizacion009.html".into(),
        };
        assert_eq!(e.archivo(), "cotizacion009.html");
    }

    #[test]
    fn provider_not_configured_display() {
        let e = CotizadorError::ProviderNotConfigured {
            provider: "anthropic".into(),
            hint: "set ANTHROPIC_API_KEY".into(),
        };
        assert!(e.to_string().contains("anthropic"));
        assert!(e.to_string().contains("ANTHROPIC_API_KEY"));
    }
}
