//! Records exchanged between pipeline stages.
//!
//! Field names follow the Spanish vocabulary of the documents being
//! evaluated (`producto`, `monto_total`, ...) so that the serialized JSON
//! matches what extraction prompts ask for and what downstream consumers
//! of the diagnostic artifact expect.

use crate::error::OfferError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// First numeric token in a text amount, with any grouping punctuation.
static RE_AMOUNT_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d[\d.,]*").unwrap());

/// Plain decimal: `745`, `19.50`.
static RE_PLAIN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());

/// Comma-grouped thousands with an optional dot decimal: `1,200.50`.
static RE_COMMA_GROUPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{1,3}(,\d{3})+(\.\d+)?$").unwrap());

/// Reads equally well as a dot-grouped thousand: `1.200`.
static RE_DOT_THOUSAND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?[1-9]\d{0,2}\.\d{3}$").unwrap());

/// One line of the procurement request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedItem {
    /// Product description; empty when the cell was missing.
    pub producto: String,
    /// Quantity exactly as written in the source document.
    pub cantidad: String,
    /// Unit of measure, if the table has a unit column.
    pub unidad: Option<String>,
}

/// Result of parsing the procurement-request document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolicitudData {
    pub items_solicitados: Vec<RequestedItem>,
    pub fecha_solicitud: String,
}

/// A quoted line item inside a [`BidderRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub item: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub descripcion: String,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub cantidad: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub precio: Option<f64>,
}

/// Normalized representation of one competing quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidderRecord {
    /// Source document file name. Natural key within a run.
    pub archivo: String,
    pub empresa: String,
    /// Tax identifier; empty when the offer does not state one.
    pub ruc: String,
    /// Quotation date, free text.
    pub fecha: String,
    pub items: Vec<OfferItem>,
    /// Grand total. Always finite.
    pub monto_total: f64,
}

/// Shape of an extraction result before validation. Everything is
/// optional and loosely typed; [`BidderRecord::from_extraction`] decides
/// what is usable.
#[derive(Debug, Deserialize)]
struct RawBidderRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    empresa: String,
    #[serde(default, deserialize_with = "lenient_string")]
    ruc: String,
    #[serde(default, deserialize_with = "lenient_string")]
    fecha: String,
    #[serde(default, deserialize_with = "lenient_items")]
    items: Vec<OfferItem>,
    #[serde(default, deserialize_with = "lenient_number")]
    monto_total: Option<f64>,
}

impl BidderRecord {
    /// Build a record from oracle JSON text.
    ///
    /// `archivo` always comes from the caller; whatever the oracle put in
    /// that field is discarded. A record without a finite `monto_total` is
    /// rejected so it can never take part in the minimum computation.
    pub fn from_extraction(json: &str, archivo: &str) -> Result<Self, OfferError> {
        let raw: RawBidderRecord =
            serde_json::from_str(json).map_err(|e| OfferError::MalformedJson {
                archivo: archivo.to_string(),
                detail: e.to_string(),
            })?;

        let monto_total = raw
            .monto_total
            .filter(|t| t.is_finite())
            .ok_or_else(|| OfferError::MissingTotal {
                archivo: archivo.to_string(),
            })?;

        Ok(BidderRecord {
            archivo: archivo.to_string(),
            empresa: raw.empresa,
            ruc: raw.ruc,
            fecha: raw.fecha,
            items: raw.items,
            monto_total,
        })
    }
}

/// Diagnostic summary of one offers-stage run.
#[derive(Debug, Clone, Serialize)]
pub struct OfferSummary<'a> {
    pub total_cotizaciones: usize,
    pub cotizaciones: &'a [BidderRecord],
}

// ── Lenient field decoding ───────────────────────────────────────────────

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// `null` or a non-array `items` reads as no items. Elements that do not
/// look like an item are dropped.
fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<OfferItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(values)) => values
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// Read a number that may have been written as text, e.g. `"S/. 1,200.50"`.
pub(crate) fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Read the first number in `text`.
///
/// Only a plain decimal or comma-grouped thousands with a dot decimal are
/// accepted. Comma decimals (`1.200,50`, `12,5`) and a lone dot followed
/// by three digits (`1.200`) have two plausible readings and give `None`.
fn parse_amount(text: &str) -> Option<f64> {
    let token = RE_AMOUNT_TOKEN.find(text)?.as_str();
    let token = token.trim_end_matches(['.', ',']);
    let normalized = if RE_COMMA_GROUPED.is_match(token) {
        token.replace(',', "")
    } else if RE_PLAIN.is_match(token) && !RE_DOT_THOUSAND.is_match(token) {
        token.to_string()
    } else {
        return None;
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}
