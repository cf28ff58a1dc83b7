//! Progress-callback trait for evaluation events.
//!
//! Inject an [`Arc<dyn EvaluationProgressCallback>`] via
//! [`crate::config::EvaluationConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages and offer documents.
//!
//! # Example
//!
//! ```rust
//! use cotizador::{EvaluationConfig, EvaluationProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     skipped: AtomicUsize,
//! }
//!
//! impl EvaluationProgressCallback for CountingCallback {
//!     fn on_offer_error(&self, archivo: &str, error: &str) {
//!         self.skipped.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("skipped {archivo}: {error}");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { skipped: AtomicUsize::new(0) });
//!
//! let config = EvaluationConfig::builder()
//!     .progress_callback(counter as Arc<dyn EvaluationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::state::Stage;
use std::sync::Arc;

/// Called by the orchestrator and the offers stage as the run advances.
///
/// All methods have default no-op implementations so callers only
/// override what they care about.
pub trait EvaluationProgressCallback: Send + Sync {
    /// Called before a stage runs. `stage` is the state the stage will
    /// move the run into.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called before an offer document is handed to the oracle.
    ///
    /// # Arguments
    /// * `archivo` — file name of the offer document
    /// * `index`   — 1-indexed position in discovery order
    /// * `total`   — number of offer documents discovered
    fn on_offer_start(&self, archivo: &str, index: usize, total: usize) {
        let _ = (archivo, index, total);
    }

    /// Called when an offer produced a valid bidder record.
    fn on_offer_complete(&self, archivo: &str, monto_total: f64) {
        let _ = (archivo, monto_total);
    }

    /// Called when an offer was skipped.
    fn on_offer_error(&self, archivo: &str, error: &str) {
        let _ = (archivo, error);
    }

    /// Called once, after the winner stage, with the final status message.
    fn on_evaluation_complete(&self, message: &str) {
        let _ = message;
    }
}

/// A callback that ignores every event. Useful as a base for callers that
/// want to pass an explicit callback; an unset `progress_callback` simply
/// emits nothing.
pub struct NoopProgressCallback;

impl EvaluationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::EvaluationConfig`].
pub type ProgressCallback = Arc<dyn EvaluationProgressCallback>;
