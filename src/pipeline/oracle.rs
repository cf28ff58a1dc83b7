//! The extraction oracle: offer document in, bidder-record JSON out.
//!
//! [`ExtractionOracle`] is the capability the offers stage depends on. Two
//! implementations ship with the crate:
//!
//! * [`FixtureOracle`] — a fixed dataset keyed by file name. Deterministic,
//!   no network; used for demos and tests.
//! * [`LlmOracle`] — a generative model behind an `edgequake_llm` provider.
//!
//! [`Oracle`] wraps both and is what [`crate::evaluate::Evaluator`] builds
//! from [`crate::config::OracleMode`]. The choice is made once, at
//! construction; the offers stage never branches on it.

use crate::config::{EvaluationConfig, OracleMode};
use crate::error::{CotizadorError, OfferError};
pub use crate::pipeline::llm::LlmOracle;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use tracing::info;

/// One offer document, fully read into memory.
#[derive(Debug, Clone)]
pub struct OfferDocument {
    /// File name, e.g. `cotizacion001.html`.
    pub archivo: String,
    pub content: String,
}

/// Turns an offer document into JSON text shaped like a
/// [`crate::record::BidderRecord`].
///
/// The output is untrusted: the offers stage cleans it, parses it,
/// validates the total and overwrites `archivo`.
pub trait ExtractionOracle: Send + Sync {
    fn extract(
        &self,
        doc: &OfferDocument,
    ) -> impl Future<Output = Result<String, OfferError>> + Send;
}

// ── Fixture oracle ───────────────────────────────────────────────────────────

/// Built-in dataset: three quotations for the same two-product request.
const BUILTIN_FIXTURES: &str = r#"[
    {
        "archivo": "cotizacion001.html",
        "empresa": "FERTILIZANTES UNIDOS S.A.",
        "ruc": "",
        "fecha": "Miércoles, 3 de septiembre de 2025 09:30",
        "items": [
            { "item": "1", "descripcion": "CLIP PH (1 LT)", "cantidad": 5.0, "precio": 19.0 },
            { "item": "2", "descripcion": "UPAXIAL (1 LT)", "cantidad": 5.0, "precio": 130.0 }
        ],
        "monto_total": 745.0
    },
    {
        "archivo": "cotizacion002.html",
        "empresa": "AGRO CLINJER S.A.C.",
        "ruc": "",
        "fecha": "Miércoles, 3 de septiembre de 2025 11:20",
        "items": [
            { "item": "1", "descripcion": "CLIP PH (1 LT)", "cantidad": 5.0, "precio": 90.0 },
            { "item": "2", "descripcion": "UPAXIAL (1 LT)", "cantidad": 5.0, "precio": 700.0 }
        ],
        "monto_total": 790.0
    },
    {
        "archivo": "cotizacion003.html",
        "empresa": "INVERSIONES AGRICOLAS S.A.C.",
        "ruc": "",
        "fecha": "Jueves, 4 de septiembre de 2025 08:30",
        "items": [
            { "item": "1", "descripcion": "CLIP PH (1 LT)", "cantidad": 5.0, "precio": 80.0 },
            { "item": "2", "descripcion": "UPAXIAL (1 LT)", "precio": 80.0 },
            { "item": "2", "descripcion": "UPAXIAL (1 LT)", "cantidad": 5.0, "precio": 600.0 }
        ],
        "monto_total": 680.0
    }
]"#;

/// Deterministic oracle answering from a fixed set of records.
///
/// Document content is ignored; the answer depends only on the file name.
/// A document with no fixture entry is reported as [`OfferError::NoFixture`].
#[derive(Debug, Clone, Default)]
pub struct FixtureOracle {
    records: HashMap<String, String>,
}

impl FixtureOracle {
    /// The built-in three-offer dataset.
    pub fn builtin() -> Self {
        // The constant is valid JSON; covered by `builtin_dataset_has_three_offers`.
        Self::from_json(BUILTIN_FIXTURES).unwrap_or_default()
    }

    /// Load a JSON array of records from a file.
    pub fn from_path(path: &Path) -> Result<Self, CotizadorError> {
        let text = std::fs::read_to_string(path).map_err(|e| CotizadorError::FixtureLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|detail| CotizadorError::FixtureLoad {
            path: path.to_path_buf(),
            detail,
        })
    }

    /// Parse a JSON array of records. Each element must carry `archivo`.
    pub fn from_json(text: &str) -> Result<Self, String> {
        let values: Vec<Value> = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let mut records = HashMap::with_capacity(values.len());
        for (i, value) in values.into_iter().enumerate() {
            let archivo = value
                .get("archivo")
                .and_then(Value::as_str)
                .ok_or_else(|| format!("record {i} has no \"archivo\""))?
                .to_string();
            records.insert(archivo, value.to_string());
        }
        Ok(Self { records })
    }

    /// Number of fixture records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ExtractionOracle for FixtureOracle {
    async fn extract(&self, doc: &OfferDocument) -> Result<String, OfferError> {
        self.records
            .get(&doc.archivo)
            .cloned()
            .ok_or_else(|| OfferError::NoFixture {
                archivo: doc.archivo.clone(),
            })
    }
}

// ── Configured oracle ────────────────────────────────────────────────────────

/// The oracle selected by [`OracleMode`].
pub enum Oracle {
    Fixture(FixtureOracle),
    Llm(LlmOracle),
}

impl Oracle {
    /// Build the oracle named by `config.oracle`.
    ///
    /// Fails only when the fixture file cannot be loaded or no LLM provider
    /// can be resolved; both are setup failures for the whole run.
    pub fn from_config(config: &EvaluationConfig) -> Result<Self, CotizadorError> {
        match config.oracle {
            OracleMode::Fixture => {
                let fixtures = match &config.fixture_path {
                    Some(path) => FixtureOracle::from_path(path)?,
                    None => FixtureOracle::builtin(),
                };
                info!("Using fixture oracle ({} records)", fixtures.len());
                Ok(Oracle::Fixture(fixtures))
            }
            OracleMode::Llm => {
                let llm = LlmOracle::from_config(config)?;
                info!("Using LLM oracle ({})", llm.describe());
                Ok(Oracle::Llm(llm))
            }
        }
    }
}

impl ExtractionOracle for Oracle {
    async fn extract(&self, doc: &OfferDocument) -> Result<String, OfferError> {
        match self {
            Oracle::Fixture(f) => f.extract(doc).await,
            Oracle::Llm(l) => l.extract(doc).await,
        }
    }
}
