//! Request reader: requested items and date from the procurement request.
//!
//! Only tables whose header row has a product-like column are read; every
//! row of those tables becomes a [`RequestedItem`]. Prices and subtotals
//! are dropped on this side.
//!
//! The request date is found with two heuristics, in order:
//! 1. the first `<fecha>`, `<date>`, `<time>` or `<span>` whose text
//!    contains a `YYYY-MM-DD` date;
//! 2. the text following `Enviado el:` in the flattened document text
//!    (the header line most mail clients add to a forwarded message).
//!
//! Both are brittle by nature. When neither matches the date is
//! [`DATE_NOT_SPECIFIED`].

use crate::error::RequestError;
use crate::pipeline::table::{parse_tables, ColumnRole};
use crate::record::{RequestedItem, SolicitudData};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::path::Path;
use tracing::{debug, info};

/// Sentinel date for requests with no recognisable date.
pub const DATE_NOT_SPECIFIED: &str = "No especificada";

static RE_ISO_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

static RE_SENT_ON: Lazy<Regex> = Lazy::new(|| Regex::new(r"Enviado el:\s*(.+)").unwrap());

/// Read and parse the procurement-request document at `path`.
pub async fn read_request(path: &Path) -> Result<SolicitudData, RequestError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RequestError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            RequestError::Unreadable {
                path: path.to_path_buf(),
                detail: e.to_string(),
            }
        }
    })?;
    let html = String::from_utf8(bytes).map_err(|e| RequestError::Unreadable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let data = parse_request(&html);
    info!(
        "Read request {}: {} items, date {:?}",
        path.display(),
        data.items_solicitados.len(),
        data.fecha_solicitud
    );
    Ok(data)
}

/// Parse request HTML that is already in memory.
pub fn parse_request(html: &str) -> SolicitudData {
    let doc = Html::parse_document(html);

    let items_solicitados: Vec<RequestedItem> = parse_tables(&doc)
        .into_iter()
        .filter(|t| t.has_role(ColumnRole::Product))
        .flat_map(|t| t.rows)
        .map(|row| RequestedItem {
            producto: row.product.unwrap_or_default(),
            cantidad: row.quantity.unwrap_or_default(),
            unidad: row.unit,
        })
        .collect();

    SolicitudData {
        items_solicitados,
        fecha_solicitud: extract_request_date(&doc),
    }
}

/// Apply the date heuristics described in the module docs.
pub fn extract_request_date(doc: &Html) -> String {
    let date_sel = Selector::parse("fecha, date, time, span").expect("static selector");

    let tagged = doc.select(&date_sel).find_map(|el| {
        let text = el.text().collect::<String>();
        let text = text.trim();
        RE_ISO_DATE.is_match(text).then(|| text.to_string())
    });
    if let Some(date) = tagged {
        debug!("Request date from tag: {}", date);
        return date;
    }

    let flat = doc.root_element().text().collect::<Vec<_>>().join("\n");
    if let Some(caps) = RE_SENT_ON.captures(&flat) {
        let date = caps[1].trim().to_string();
        debug!("Request date from 'Enviado el:' line: {}", date);
        return date;
    }

    DATE_NOT_SPECIFIED.to_string()
}
