//! CLI binary for cotizador.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `EvaluationConfig`, runs one evaluation and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use cotizador::{
    evaluate, EvaluationConfig, EvaluationProgressCallback, OracleMode, ProgressCallback, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner plus one log line per offer document.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl EvaluationProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message("");
    }

    fn on_offer_start(&self, archivo: &str, index: usize, total: usize) {
        self.bar.set_message(format!("{index}/{total}  {archivo}"));
    }

    fn on_offer_complete(&self, archivo: &str, monto_total: f64) {
        self.bar.println(format!(
            "  {} {:<28} {}",
            green("✓"),
            archivo,
            dim(&format!("{monto_total:>12.2}"))
        ));
    }

    fn on_offer_error(&self, archivo: &str, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} {:<28} {}", red("✗"), archivo, red(&msg)));
    }

    fn on_evaluation_complete(&self, _message: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Evaluate the demo mailbox with the built-in fixture dataset
  cotizador --request demos/emails/solicitud-cotizacion.html --offers-dir demos/emails

  # Extract offers with an LLM
  cotizador --oracle llm --provider openai --model gpt-4.1-mini

  # Full final state as JSON
  cotizador --json > resultado.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Log filter, e.g. cotizador=debug
"#;

/// Compare price quotations and pick the lowest offer.
#[derive(Parser, Debug)]
#[command(
    name = "cotizador",
    version,
    about = "Compare price quotations against a procurement request and pick the lowest offer",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Procurement-request HTML document.
    #[arg(long, env = "COTIZADOR_REQUEST", default_value = "./emails/solicitud-cotizacion.html")]
    request: PathBuf,

    /// Directory holding the offer documents.
    #[arg(long, env = "COTIZADOR_OFFERS_DIR", default_value = "./emails")]
    offers_dir: PathBuf,

    /// File-name prefix of offer documents (suffix is always .html).
    #[arg(long, env = "COTIZADOR_PREFIX", default_value = "cotizacion")]
    prefix: String,

    /// Extraction oracle.
    #[arg(long, env = "COTIZADOR_ORACLE", value_enum, default_value = "fixture")]
    oracle: OracleArg,

    /// JSON array of fixture records (fixture oracle only).
    #[arg(long, env = "COTIZADOR_FIXTURES")]
    fixtures: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "COTIZADOR_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Max LLM output tokens per offer.
    #[arg(long, env = "COTIZADOR_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Retries per offer on LLM failure.
    #[arg(long, env = "COTIZADOR_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Per-offer extraction timeout in seconds.
    #[arg(long, env = "COTIZADOR_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "COTIZADOR_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Print the full final state as JSON instead of the report.
    #[arg(long)]
    json: bool,

    /// Also print the offer summary produced by the offers stage.
    #[arg(long)]
    show_offers: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "COTIZADOR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "COTIZADOR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the report.
    #[arg(short, long, env = "COTIZADOR_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OracleArg {
    Fixture,
    Llm,
}

impl From<OracleArg> for OracleMode {
    fn from(v: OracleArg) -> Self {
        match v {
            OracleArg::Fixture => OracleMode::Fixture,
            OracleArg::Llm => OracleMode::Llm,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn EvaluationProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let state = evaluate(config).await.context("Evaluation setup failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&state).context("Failed to serialise state")?;
        println!("{json}");
        return Ok(());
    }

    if cli.show_offers {
        for summary in &state.cotizaciones_content {
            println!("{summary}");
        }
    }

    if !cli.quiet {
        println!();
        println!("{}", bold("Resultado del proceso:"));
    }
    print!("{}", state.report());

    Ok(())
}

/// Map CLI args to `EvaluationConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<EvaluationConfig> {
    let mut builder = EvaluationConfig::builder()
        .request_path(&cli.request)
        .offers_dir(&cli.offers_dir)
        .offer_prefix(&cli.prefix)
        .oracle(cli.oracle.clone().into())
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref path) = cli.fixtures {
        builder = builder.fixture_path(path);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
