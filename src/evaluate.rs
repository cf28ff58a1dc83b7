//! Pipeline orchestrator.
//!
//! Runs the three stages in fixed order over one [`EvaluationState`]:
//!
//! ```text
//! INIT ─▶ REQUEST_READ ─▶ OFFERS_EXTRACTED ─▶ WINNER_DETERMINED
//! ```
//!
//! Every stage runs even when an earlier one failed; each reads only the
//! fields it needs and tolerates them being empty. No stage is retried.
//! The only error that escapes is a setup failure while building the
//! [`Evaluator`].

use crate::config::EvaluationConfig;
use crate::error::CotizadorError;
use crate::pipeline::oracle::{ExtractionOracle, Oracle};
use crate::pipeline::{offers, request, winner};
use crate::state::{EvaluationState, Stage};
use std::time::Instant;
use tracing::info;

/// Owns the configuration and the extraction oracle for evaluation runs.
pub struct Evaluator<O = Oracle> {
    config: EvaluationConfig,
    oracle: O,
}

impl Evaluator<Oracle> {
    /// Build the oracle selected by `config.oracle`.
    pub fn new(config: EvaluationConfig) -> Result<Self, CotizadorError> {
        let oracle = Oracle::from_config(&config)?;
        Ok(Self { config, oracle })
    }
}

impl<O: ExtractionOracle> Evaluator<O> {
    /// Use a caller-supplied oracle instead of the configured one.
    pub fn with_oracle(config: EvaluationConfig, oracle: O) -> Self {
        Self { config, oracle }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Run the full pipeline once on a fresh state.
    pub async fn run(&self) -> EvaluationState {
        let start = Instant::now();
        let mut state = EvaluationState::new();

        // ── Stage 1: Request reader ──────────────────────────────────────
        self.notify(Stage::RequestRead);
        state.apply_request(request::read_request(&self.config.request_path).await);
        info!("{}", state.message);

        // ── Stage 2: Offer extractor ─────────────────────────────────────
        self.notify(Stage::OffersExtracted);
        state.apply_offers(offers::extract_offers(&self.oracle, &self.config).await);
        info!("{}", state.message);

        // ── Stage 3: Winner selector ─────────────────────────────────────
        self.notify(Stage::WinnerDetermined);
        let winner = winner::select_winner(&state.postores);
        state.apply_winner(winner);
        info!("{}", state.message);

        info!(
            "Evaluation complete: {} bidders in {}ms",
            state.postores.len(),
            start.elapsed().as_millis()
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_evaluation_complete(&state.message);
        }
        state
    }

    fn notify(&self, stage: Stage) {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage_start(stage);
        }
    }
}

/// Evaluate all quotations described by `config`.
///
/// # Errors
/// Returns `Err(CotizadorError)` only when the evaluator cannot be set up
/// (fixture file unreadable, no LLM provider). Stage failures are reported
/// through [`EvaluationState::message`].
pub async fn evaluate(config: EvaluationConfig) -> Result<EvaluationState, CotizadorError> {
    let evaluator = Evaluator::new(config)?;
    Ok(evaluator.run().await)
}

/// Synchronous wrapper around [`evaluate`].
///
/// Creates a temporary tokio runtime internally.
pub fn evaluate_sync(config: EvaluationConfig) -> Result<EvaluationState, CotizadorError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CotizadorError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(evaluate(config))
}
