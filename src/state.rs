//! The evaluation state threaded through the pipeline.
//!
//! Stage functions in [`crate::pipeline`] never touch this type. They
//! return a typed `Result`, and the orchestrator folds it in through one of
//! the `apply_*` methods below. Each method documents exactly which fields
//! it writes.

use crate::error::{DiscoveryError, RequestError};
use crate::pipeline::offers::OfferBatch;
use crate::record::{BidderRecord, OfferSummary, SolicitudData};
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Position of a run in the linear pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub enum Stage {
    /// State constructed, nothing run yet.
    #[default]
    Init,
    RequestRead,
    OffersExtracted,
    /// Terminal.
    WinnerDetermined,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::RequestRead => "read_solicitud",
            Stage::OffersExtracted => "read_cotizaciones",
            Stage::WinnerDetermined => "determine_winner",
        };
        f.write_str(name)
    }
}

/// Everything one run knows. Created fresh per run, owned by the
/// orchestrator, handed back to the caller at the end.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationState {
    /// Serialized [`SolicitudData`]; empty until the request is read.
    pub solicitud_content: String,
    /// One serialized [`OfferSummary`] per offers-stage run.
    pub cotizaciones_content: Vec<String>,
    /// Valid bidder records in discovery order.
    pub postores: Vec<BidderRecord>,
    /// Lowest offer; always an element of `postores`.
    pub ganador: Option<BidderRecord>,
    /// Status of the last stage that ran.
    pub message: String,
    pub stage: Stage,
}

impl EvaluationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the request-reader result.
    ///
    /// Writes `solicitud_content` (success only) and `message`.
    pub fn apply_request(&mut self, result: Result<SolicitudData, RequestError>) {
        self.stage = Stage::RequestRead;
        match result {
            Ok(data) => match serde_json::to_string_pretty(&data) {
                Ok(json) => {
                    self.solicitud_content = json;
                    self.message = "Solicitud de cotización leída exitosamente".to_string();
                }
                Err(e) => {
                    self.message = format!("Error: no se pudo serializar la solicitud: {e}");
                }
            },
            Err(e) => {
                warn!("Request stage failed: {}", e);
                self.message = format!("Error: {e}");
            }
        }
    }

    /// Fold the offer-extractor result.
    ///
    /// Writes `postores`, `cotizaciones_content` and `message`. On a
    /// stage-level failure `postores` is left untouched.
    pub fn apply_offers(&mut self, result: Result<OfferBatch, DiscoveryError>) {
        self.stage = Stage::OffersExtracted;
        let batch = match result {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Offers stage failed: {}", e);
                self.message = format!("Error procesando cotizaciones: {e}");
                return;
            }
        };

        let summary = OfferSummary {
            total_cotizaciones: batch.postores.len(),
            cotizaciones: &batch.postores,
        };
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => self.cotizaciones_content.push(json),
            Err(e) => warn!("Could not serialize offer summary: {}", e),
        }

        self.message = if batch.skipped.is_empty() {
            format!("Se procesaron {} cotizaciones", batch.postores.len())
        } else {
            format!(
                "Se procesaron {} cotizaciones ({} omitidas)",
                batch.postores.len(),
                batch.skipped.len()
            )
        };
        self.postores = batch.postores;
    }

    /// Fold the winner-selector result: an index into `postores`.
    ///
    /// Writes `ganador` and `message`.
    pub fn apply_winner(&mut self, winner: Option<usize>) {
        self.stage = Stage::WinnerDetermined;
        match winner.and_then(|i| self.postores.get(i)) {
            Some(g) => {
                self.message = format!(
                    "El ganador es {} del archivo {} con un monto de {:.2}",
                    g.empresa, g.archivo, g.monto_total
                );
                self.ganador = Some(g.clone());
            }
            None => {
                self.ganador = None;
                self.message = "No hay postores para evaluar".to_string();
            }
        }
    }

    /// Human-readable final report. Always names a winner or says that
    /// none was determined.
    pub fn report(&self) -> String {
        let mut out = format!("Mensaje final: {}\n", self.message);
        match &self.ganador {
            Some(g) => {
                out.push_str(&format!("Postor ganador: {}\n", g.empresa));
                out.push_str(&format!("Archivo: {}\n", g.archivo));
                out.push_str(&format!("Monto: {:.2}\n", g.monto_total));
            }
            None => out.push_str("No se determinó un ganador\n"),
        }
        out
    }
}
