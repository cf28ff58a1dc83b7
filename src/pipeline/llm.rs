//! LLM-backed extraction oracle.
//!
//! Sends one chat request per offer document: the system prompt from
//! [`crate::prompts`] (or the configured override) followed by a user
//! message embedding the record schema and the raw HTML. The reply is run
//! through [`crate::pipeline::postprocess::clean_json_response`] and handed
//! back as text; parsing and validation happen in the offers stage.
//!
//! ## Retry Strategy
//!
//! Transient provider errors (429, 5xx) are retried with exponential
//! backoff, `retry_backoff_ms * 2^(attempt-1)`: 500 ms → 1 s with the
//! defaults. The per-document timeout enforced by the offers stage bounds
//! the whole sequence, retries included.

use crate::config::EvaluationConfig;
use crate::error::{CotizadorError, OfferError};
use crate::pipeline::oracle::{ExtractionOracle, OfferDocument};
use crate::pipeline::postprocess::clean_json_response;
use crate::prompts::{extraction_prompt, DEFAULT_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Extraction oracle calling a generative model.
pub struct LlmOracle {
    provider: Arc<dyn LLMProvider>,
    label: String,
    system_prompt: String,
    options: CompletionOptions,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl LlmOracle {
    /// Wrap an already-built provider, taking the remaining knobs from `config`.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &EvaluationConfig) -> Self {
        let label = match (&config.provider_name, &config.model) {
            _ if config.provider.is_some() => "custom provider".to_string(),
            (Some(name), model) => format!("{name}/{}", model.as_deref().unwrap_or(DEFAULT_MODEL)),
            (None, Some(model)) => format!("auto/{model}"),
            (None, None) => "auto".to_string(),
        };
        Self {
            provider,
            label,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            options: build_options(config),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }

    /// Resolve a provider from `config` and the environment.
    pub fn from_config(config: &EvaluationConfig) -> Result<Self, CotizadorError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }

    /// Short label for logs.
    pub fn describe(&self) -> &str {
        &self.label
    }
}

/// Build `CompletionOptions` from the evaluation config.
fn build_options(config: &EvaluationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

impl ExtractionOracle for LlmOracle {
    async fn extract(&self, doc: &OfferDocument) -> Result<String, OfferError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(&self.system_prompt),
            ChatMessage::user(extraction_prompt(&doc.archivo, &doc.content)),
        ];
        let mut last_err: Option<String> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "{}: retry {}/{} after {}ms",
                    doc.archivo, attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.provider.chat(&messages, Some(&self.options)).await {
                Ok(response) => {
                    debug!(
                        "{}: {} input tokens, {} output tokens, {:?}",
                        doc.archivo,
                        response.prompt_tokens,
                        response.completion_tokens,
                        start.elapsed()
                    );
                    return Ok(clean_json_response(&response.content));
                }
                Err(e) => {
                    let err_msg = e.to_string();
                    warn!("{}: attempt {} failed — {}", doc.archivo, attempt + 1, err_msg);
                    last_err = Some(err_msg);
                }
            }
        }

        Err(OfferError::OracleFailed {
            archivo: doc.archivo.clone(),
            retries: self.max_retries,
            detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
        })
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, CotizadorError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        CotizadorError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. pre-built provider (`config.provider`)
/// 2. named provider + model (`config.provider_name`, `config.model`)
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. OpenAI, when `OPENAI_API_KEY` is set
/// 5. `ProviderFactory::from_env()` auto-detection
fn resolve_provider(config: &EvaluationConfig) -> Result<Arc<dyn LLMProvider>, CotizadorError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| CotizadorError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
