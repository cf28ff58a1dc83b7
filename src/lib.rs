//! # cotizador
//!
//! Compare competing price quotations against one procurement request and
//! pick the lowest offer.
//!
//! Quotations usually arrive as e-mails: an HTML request listing the
//! products and quantities wanted, and one HTML reply per supplier with
//! prices in whatever table layout that supplier likes. This crate reads
//! the request, turns every reply into a normalized bidder record through a
//! pluggable extraction oracle, and selects the cheapest one.
//!
//! ## Pipeline Overview
//!
//! ```text
//! emails/
//!  │
//!  ├─ 1. Request   solicitud-cotizacion.html → items + date (table heuristics)
//!  ├─ 2. Offers    cotizacion*.html → bidder records (fixture or LLM oracle)
//!  └─ 3. Winner    lowest monto_total, first one on ties
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cotizador::{evaluate, EvaluationConfig, OracleMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EvaluationConfig::builder()
//!         .request_path("emails/solicitud-cotizacion.html")
//!         .offers_dir("emails")
//!         .oracle(OracleMode::Llm)
//!         .build()?;
//!     let state = evaluate(config).await?;
//!     print!("{}", state.report());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cotizador` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod evaluate;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod record;
pub mod state;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{EvaluationConfig, EvaluationConfigBuilder, OracleMode};
pub use error::{CotizadorError, DiscoveryError, OfferError, RequestError};
pub use evaluate::{evaluate, evaluate_sync, Evaluator};
pub use pipeline::oracle::{ExtractionOracle, FixtureOracle, LlmOracle, OfferDocument, Oracle};
pub use progress::{EvaluationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use record::{BidderRecord, OfferItem, RequestedItem, SolicitudData};
pub use state::{EvaluationState, Stage};
