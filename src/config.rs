//! Configuration types for a quotation evaluation run.
//!
//! All behaviour is controlled through [`EvaluationConfig`], built via its
//! [`EvaluationConfigBuilder`]. The oracle mode is chosen here, once, and
//! the orchestrator builds the matching oracle at construction time.

use crate::error::CotizadorError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// File-name suffix every offer document must carry.
pub const OFFER_SUFFIX: &str = ".html";

/// Configuration for one evaluation run.
///
/// # Example
/// ```rust
/// use cotizador::{EvaluationConfig, OracleMode};
///
/// let config = EvaluationConfig::builder()
///     .offers_dir("./emails")
///     .offer_prefix("cotizacion")
///     .oracle(OracleMode::Llm)
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct EvaluationConfig {
    /// Path of the procurement-request document.
    /// Default: `./emails/solicitud-cotizacion.html`.
    pub request_path: PathBuf,

    /// Directory scanned for offer documents. Default: `./emails`.
    pub offers_dir: PathBuf,

    /// File-name prefix of offer documents. Default: `cotizacion`.
    pub offer_prefix: String,

    /// Which extraction oracle turns offer documents into bidder records.
    pub oracle: OracleMode,

    /// JSON file with fixture records, used by [`OracleMode::Fixture`].
    /// If None, the built-in dataset is used.
    pub fixture_path: Option<PathBuf>,

    /// LLM model identifier. If None, uses `gpt-4.1-nano`.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.0.
    ///
    /// Extraction must be reproducible, so the default is fully greedy.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per offer. Default: 4096.
    pub max_tokens: usize,

    /// Retries on a failed oracle call. Default: 2.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-offer oracle timeout in seconds. Default: 60.
    ///
    /// A timeout is treated like any other extraction failure: the offer
    /// is skipped.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses the built-in one.
    pub system_prompt: Option<String>,

    /// Optional progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            request_path: PathBuf::from("./emails/solicitud-cotizacion.html"),
            offers_dir: PathBuf::from("./emails"),
            offer_prefix: "cotizacion".to_string(),
            oracle: OracleMode::default(),
            fixture_path: None,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.0,
            max_tokens: 4096,
            max_retries: 2,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            system_prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for EvaluationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationConfig")
            .field("request_path", &self.request_path)
            .field("offers_dir", &self.offers_dir)
            .field("offer_prefix", &self.offer_prefix)
            .field("oracle", &self.oracle)
            .field("fixture_path", &self.fixture_path)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn EvaluationProgressCallback>"),
            )
            .finish()
    }
}

impl EvaluationConfig {
    /// Create a new builder for `EvaluationConfig`.
    pub fn builder() -> EvaluationConfigBuilder {
        EvaluationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Does `file_name` name an offer document?
    pub fn is_offer_file(&self, file_name: &str) -> bool {
        file_name.starts_with(&self.offer_prefix) && file_name.ends_with(OFFER_SUFFIX)
    }
}

/// Builder for [`EvaluationConfig`].
#[derive(Debug)]
pub struct EvaluationConfigBuilder {
    config: EvaluationConfig,
}

impl EvaluationConfigBuilder {
    pub fn request_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.request_path = path.into();
        self
    }

    pub fn offers_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.offers_dir = dir.into();
        self
    }

    pub fn offer_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.offer_prefix = prefix.into();
        self
    }

    pub fn oracle(mut self, mode: OracleMode) -> Self {
        self.config.oracle = mode;
        self
    }

    pub fn fixture_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.fixture_path = Some(path.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EvaluationConfig, CotizadorError> {
        let c = &self.config;
        if c.offer_prefix.is_empty() {
            return Err(CotizadorError::InvalidConfig(
                "Offer prefix must not be empty".into(),
            ));
        }
        if c.offer_prefix.contains(['/', '\\']) {
            return Err(CotizadorError::InvalidConfig(format!(
                "Offer prefix must be a bare file-name prefix, got '{}'",
                c.offer_prefix
            )));
        }
        if c.api_timeout_secs == 0 {
            return Err(CotizadorError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Which extraction oracle a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OracleMode {
    /// Deterministic fixture dataset keyed by file name. No network. (default)
    #[default]
    Fixture,
    /// Generative model behind an `edgequake_llm` provider.
    Llm,
}
