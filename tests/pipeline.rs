//! End-to-end tests for the evaluation pipeline.
//!
//! Every test builds a throwaway mailbox in a `TempDir` (or uses the demo
//! mailbox under `demos/emails/`) and drives the orchestrator with either
//! the built-in fixture oracle or a scripted in-test oracle. No network.
//!
//! Run with:
//!   cargo test --test pipeline -- --nocapture

use cotizador::{
    evaluate, evaluate_sync, CotizadorError, EvaluationConfig, EvaluationProgressCallback,
    Evaluator, ExtractionOracle, NoopProgressCallback, OfferDocument, OfferError, OracleMode,
    SolicitudData, Stage,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const REQUEST_HTML: &str = r#"<html><body>
<p><b>Enviado el:</b> 10/09/2025</p>
<table>
  <tr><th>Producto</th><th>Cantidad</th><th>Unidad</th></tr>
  <tr><td>CLIP PH (1 LT)</td><td>5</td><td>LT</td></tr>
</table>
</body></html>"#;

const OFFER_HTML: &str = "<html><body><table><tr><th>Descripción</th><th>Precio</th></tr>\
                          <tr><td>CLIP PH (1 LT)</td><td>19.00</td></tr></table></body></html>";

/// A mailbox with the request document and the given offer files.
fn mailbox(offers: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("solicitud-cotizacion.html"), REQUEST_HTML).unwrap();
    for name in offers {
        std::fs::write(dir.path().join(name), OFFER_HTML).unwrap();
    }
    dir
}

fn config_for(dir: &Path) -> EvaluationConfig {
    EvaluationConfig::builder()
        .request_path(dir.join("solicitud-cotizacion.html"))
        .offers_dir(dir)
        .build()
        .expect("valid config")
}

/// Oracle answering from a fixed map of file name → raw response.
/// Documents not in the map get an error.
struct ScriptedOracle {
    answers: HashMap<String, String>,
}

impl ScriptedOracle {
    fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl ExtractionOracle for ScriptedOracle {
    async fn extract(&self, doc: &OfferDocument) -> Result<String, OfferError> {
        self.answers
            .get(&doc.archivo)
            .cloned()
            .ok_or_else(|| OfferError::OracleFailed {
                archivo: doc.archivo.clone(),
                retries: 0,
                detail: "scripted failure".into(),
            })
    }
}

// ── Full runs with the fixture oracle ────────────────────────────────────────

#[tokio::test]
async fn three_offers_lowest_total_wins() {
    init_tracing();
    let dir = mailbox(&["cotizacion001.html", "cotizacion002.html", "cotizacion003.html"]);

    let state = evaluate(config_for(dir.path())).await.expect("setup ok");

    assert_eq!(state.stage, Stage::WinnerDetermined);
    assert_eq!(state.postores.len(), 3);
    let totals: Vec<f64> = state.postores.iter().map(|p| p.monto_total).collect();
    assert_eq!(totals, vec![745.0, 790.0, 680.0]);

    let ganador = state.ganador.as_ref().expect("a winner");
    assert_eq!(ganador.archivo, "cotizacion003.html");
    assert_eq!(ganador.empresa, "INVERSIONES AGRICOLAS S.A.C.");
    assert_eq!(ganador.monto_total, 680.0);
    assert!(state.postores.contains(ganador));
    assert!(state.message.contains("cotizacion003.html"), "got: {}", state.message);
    assert!(state.message.ends_with("680.00"), "got: {}", state.message);

    let solicitud: SolicitudData =
        serde_json::from_str(&state.solicitud_content).expect("request JSON");
    assert_eq!(solicitud.fecha_solicitud, "10/09/2025");
    assert_eq!(solicitud.items_solicitados.len(), 1);
    assert_eq!(solicitud.items_solicitados[0].producto, "CLIP PH (1 LT)");
    assert_eq!(solicitud.items_solicitados[0].cantidad, "5");
    assert_eq!(solicitud.items_solicitados[0].unidad.as_deref(), Some("LT"));

    assert_eq!(state.cotizaciones_content.len(), 1);
    let summary: serde_json::Value = serde_json::from_str(&state.cotizaciones_content[0]).unwrap();
    assert_eq!(summary["total_cotizaciones"], 3);
}

#[tokio::test]
async fn missing_request_does_not_stop_the_run() {
    let dir = mailbox(&["cotizacion001.html", "cotizacion002.html"]);
    std::fs::remove_file(dir.path().join("solicitud-cotizacion.html")).unwrap();

    let state = evaluate(config_for(dir.path())).await.expect("setup ok");

    assert!(state.solicitud_content.is_empty());
    assert_eq!(state.postores.len(), 2);
    assert_eq!(
        state.ganador.as_ref().map(|g| g.archivo.as_str()),
        Some("cotizacion001.html")
    );
}

#[tokio::test]
async fn no_offers_means_no_winner() {
    let dir = mailbox(&[]);

    let state = evaluate(config_for(dir.path())).await.expect("setup ok");

    assert!(state.postores.is_empty());
    assert_eq!(state.ganador, None);
    assert_eq!(state.message, "No hay postores para evaluar");
    assert!(state.report().contains("No se determinó un ganador"));
}

#[tokio::test]
async fn missing_offers_dir_still_reports() {
    let dir = mailbox(&[]);
    let config = EvaluationConfig::builder()
        .request_path(dir.path().join("solicitud-cotizacion.html"))
        .offers_dir(dir.path().join("no-such-dir"))
        .build()
        .unwrap();

    let state = evaluate(config).await.expect("setup ok");

    assert!(!state.solicitud_content.is_empty());
    assert_eq!(state.ganador, None);
    assert_eq!(state.stage, Stage::WinnerDetermined);
}

#[tokio::test]
async fn offer_without_fixture_is_skipped() {
    let dir = mailbox(&["cotizacion001.html", "cotizacion777.html"]);

    let state = evaluate(config_for(dir.path())).await.expect("setup ok");

    let archivos: Vec<_> = state.postores.iter().map(|p| p.archivo.as_str()).collect();
    assert_eq!(archivos, vec!["cotizacion001.html"]);
    assert!(state.message.contains("cotizacion001.html"));
}

#[test]
fn sync_wrapper_runs_pipeline() {
    let dir = mailbox(&["cotizacion002.html"]);
    let state = evaluate_sync(config_for(dir.path())).expect("setup ok");
    assert_eq!(state.ganador.map(|g| g.monto_total), Some(790.0));
}

#[tokio::test]
async fn demo_mailbox_picks_cotizacion003() {
    let emails = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/emails");
    let state = evaluate(config_for(&emails)).await.expect("setup ok");

    let ganador = state.ganador.expect("a winner");
    assert_eq!(ganador.archivo, "cotizacion003.html");
    assert_eq!(ganador.monto_total, 680.0);

    let solicitud: SolicitudData = serde_json::from_str(&state.solicitud_content).unwrap();
    assert_eq!(solicitud.items_solicitados.len(), 2);
    assert_eq!(solicitud.fecha_solicitud, "10/09/2025");
}

// ── Fixture files and setup failures ─────────────────────────────────────────

#[tokio::test]
async fn fixture_file_replaces_builtin_dataset() {
    let dir = mailbox(&["cotizacion-a.html", "cotizacion-b.html"]);
    let fixtures = dir.path().join("fixtures.json");
    std::fs::write(
        &fixtures,
        r#"[
            {"archivo":"cotizacion-a.html","empresa":"A","monto_total":"1,250.00"},
            {"archivo":"cotizacion-b.html","empresa":"B","monto_total":999.9}
        ]"#,
    )
    .unwrap();
    let config = EvaluationConfig::builder()
        .request_path(dir.path().join("solicitud-cotizacion.html"))
        .offers_dir(dir.path())
        .oracle(OracleMode::Fixture)
        .fixture_path(&fixtures)
        .build()
        .unwrap();

    let state = evaluate(config).await.expect("setup ok");

    assert_eq!(state.postores[0].monto_total, 1250.0);
    assert_eq!(state.ganador.map(|g| g.empresa), Some("B".to_string()));
}

#[tokio::test]
async fn unreadable_fixture_file_is_fatal() {
    let dir = mailbox(&[]);
    let config = EvaluationConfig::builder()
        .offers_dir(dir.path())
        .fixture_path(dir.path().join("missing.json"))
        .build()
        .unwrap();

    let err = evaluate(config).await.unwrap_err();
    assert!(matches!(err, CotizadorError::FixtureLoad { .. }));
}

// ── Scripted oracle ──────────────────────────────────────────────────────────

#[tokio::test]
async fn invalid_json_offer_is_isolated() {
    let dir = mailbox(&["cotizacion001.html", "cotizacion002.html", "cotizacion003.html"]);
    let oracle = ScriptedOracle::new(&[
        ("cotizacion001.html", r#"{"empresa":"A","monto_total":745.0}"#),
        ("cotizacion002.html", "Lo siento, no encontré una cotización."),
        ("cotizacion003.html", r#"{"empresa":"C","monto_total":790.0}"#),
    ]);

    let state = Evaluator::with_oracle(config_for(dir.path()), oracle).run().await;

    let archivos: Vec<_> = state.postores.iter().map(|p| p.archivo.as_str()).collect();
    assert_eq!(archivos, vec!["cotizacion001.html", "cotizacion003.html"]);
    assert_eq!(state.ganador.map(|g| g.archivo), Some("cotizacion001.html".to_string()));
}

#[tokio::test]
async fn oracle_cannot_rename_the_source_document() {
    let dir = mailbox(&["cotizacion001.html"]);
    let oracle = ScriptedOracle::new(&[(
        "cotizacion001.html",
        r#"{"archivo":"cotizacion999.html","empresa":"A","monto_total":10}"#,
    )]);

    let state = Evaluator::with_oracle(config_for(dir.path()), oracle).run().await;

    assert_eq!(state.postores[0].archivo, "cotizacion001.html");
}

#[tokio::test]
async fn equal_totals_first_discovered_wins() {
    let dir = mailbox(&["cotizacion001.html", "cotizacion002.html", "cotizacion003.html"]);
    let oracle = ScriptedOracle::new(&[
        ("cotizacion001.html", r#"{"empresa":"A","monto_total":800}"#),
        ("cotizacion002.html", r#"{"empresa":"B","monto_total":700}"#),
        ("cotizacion003.html", r#"{"empresa":"C","monto_total":700}"#),
    ]);
    let evaluator = Evaluator::with_oracle(config_for(dir.path()), oracle);

    for _ in 0..3 {
        let state = evaluator.run().await;
        assert_eq!(state.ganador.map(|g| g.empresa), Some("B".to_string()));
    }
}

#[tokio::test]
async fn offer_without_total_never_wins() {
    let dir = mailbox(&["cotizacion001.html", "cotizacion002.html"]);
    let oracle = ScriptedOracle::new(&[
        ("cotizacion001.html", r#"{"empresa":"A","monto_total":null}"#),
        ("cotizacion002.html", r#"{"empresa":"B","monto_total":5000}"#),
    ]);

    let state = Evaluator::with_oracle(config_for(dir.path()), oracle).run().await;

    assert_eq!(state.postores.len(), 1);
    assert_eq!(state.ganador.map(|g| g.empresa), Some("B".to_string()));
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl EvaluationProgressCallback for RecordingCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.events.lock().unwrap().push(format!("stage:{stage}"));
    }

    fn on_offer_complete(&self, archivo: &str, _monto_total: f64) {
        self.events.lock().unwrap().push(format!("ok:{archivo}"));
    }

    fn on_offer_error(&self, archivo: &str, _error: &str) {
        self.events.lock().unwrap().push(format!("err:{archivo}"));
    }

    fn on_evaluation_complete(&self, _message: &str) {
        self.events.lock().unwrap().push("done".into());
    }
}

#[tokio::test]
async fn progress_events_follow_pipeline_order() {
    let dir = mailbox(&["cotizacion001.html", "cotizacion888.html"]);
    let cb = Arc::new(RecordingCallback::default());
    let config = EvaluationConfig::builder()
        .request_path(dir.path().join("solicitud-cotizacion.html"))
        .offers_dir(dir.path())
        .progress_callback(cb.clone() as Arc<dyn EvaluationProgressCallback>)
        .build()
        .unwrap();

    evaluate(config).await.expect("setup ok");

    let events = cb.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "stage:read_solicitud",
            "stage:read_cotizaciones",
            "ok:cotizacion001.html",
            "err:cotizacion888.html",
            "stage:determine_winner",
            "done",
        ]
    );
}

#[tokio::test]
async fn explicit_noop_callback_matches_unset() {
    let dir = mailbox(&["cotizacion001.html", "cotizacion003.html"]);
    let config = EvaluationConfig::builder()
        .request_path(dir.path().join("solicitud-cotizacion.html"))
        .offers_dir(dir.path())
        .progress_callback(Arc::new(NoopProgressCallback))
        .build()
        .unwrap();

    let with_noop = evaluate(config).await.expect("setup ok");
    let without = evaluate(config_for(dir.path())).await.expect("setup ok");

    assert_eq!(with_noop.message, without.message);
    assert_eq!(with_noop.ganador, without.ganador);
}
