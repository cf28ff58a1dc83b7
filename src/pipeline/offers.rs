//! Offer extractor: offer documents → validated bidder records.
//!
//! Documents are discovered in `offers_dir` by prefix and `.html` suffix,
//! sorted by file name, and processed one at a time. Each document is read,
//! handed to the [`ExtractionOracle`] under a timeout, cleaned, parsed and
//! validated. Any per-document failure is logged and recorded in
//! [`OfferBatch::skipped`]; it never stops the remaining documents.
//!
//! Only an unreadable offers directory fails the stage as a whole.

use crate::config::EvaluationConfig;
use crate::error::{DiscoveryError, OfferError};
use crate::pipeline::oracle::{ExtractionOracle, OfferDocument};
use crate::pipeline::postprocess::clean_json_response;
use crate::record::BidderRecord;
use std::path::Path;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Outcome of one offers-stage run.
#[derive(Debug, Clone, Default)]
pub struct OfferBatch {
    /// Valid records, in discovery order. At most one per document.
    pub postores: Vec<BidderRecord>,
    /// Documents that were skipped, with the reason.
    pub skipped: Vec<OfferError>,
}

/// List offer document file names in `dir`, sorted.
pub async fn discover_offers(
    dir: &Path,
    config: &EvaluationConfig,
) -> Result<Vec<String>, DiscoveryError> {
    let to_err = |source: std::io::Error| DiscoveryError {
        dir: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(to_err)?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(to_err)? {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !config.is_offer_file(&name) {
            continue;
        }
        if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        names.push(name);
    }
    names.sort();
    debug!("Discovered {} offer documents in {}", names.len(), dir.display());
    Ok(names)
}

/// Read one offer document as UTF-8 text.
pub async fn read_offer(dir: &Path, archivo: &str) -> Result<OfferDocument, OfferError> {
    let unreadable = |detail: String| OfferError::Unreadable {
        archivo: archivo.to_string(),
        detail,
    };
    let bytes = tokio::fs::read(dir.join(archivo))
        .await
        .map_err(|e| unreadable(e.to_string()))?;
    let content = String::from_utf8(bytes).map_err(|e| unreadable(e.to_string()))?;
    Ok(OfferDocument {
        archivo: archivo.to_string(),
        content,
    })
}

/// Run the offers stage over `config.offers_dir`.
pub async fn extract_offers<O: ExtractionOracle>(
    oracle: &O,
    config: &EvaluationConfig,
) -> Result<OfferBatch, DiscoveryError> {
    let dir = config.offers_dir.as_path();
    let archivos = discover_offers(dir, config).await?;
    let total = archivos.len();
    info!("Extracting {} offer documents from {}", total, dir.display());

    let mut batch = OfferBatch::default();
    for (i, archivo) in archivos.iter().enumerate() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_offer_start(archivo, i + 1, total);
        }

        let result = match read_offer(dir, archivo).await {
            Ok(doc) => extract_one(oracle, &doc, config.api_timeout_secs).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(record) => {
                info!(
                    "{}: {} — total {}",
                    record.archivo, record.empresa, record.monto_total
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_offer_complete(&record.archivo, record.monto_total);
                }
                batch.postores.push(record);
            }
            Err(e) => {
                warn!("Skipping offer: {}", e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_offer_error(archivo, &e.to_string());
                }
                batch.skipped.push(e);
            }
        }
    }

    Ok(batch)
}

/// Ask the oracle for one document and validate the answer.
pub async fn extract_one<O: ExtractionOracle>(
    oracle: &O,
    doc: &OfferDocument,
    timeout_secs: u64,
) -> Result<BidderRecord, OfferError> {
    let raw = timeout(Duration::from_secs(timeout_secs), oracle.extract(doc))
        .await
        .map_err(|_| OfferError::Timeout {
            archivo: doc.archivo.clone(),
            secs: timeout_secs,
        })??;
    BidderRecord::from_extraction(&clean_json_response(&raw), &doc.archivo)
}
