//! Prompts for LLM-backed offer extraction.
//!
//! Callers can override the system prompt via
//! [`crate::config::EvaluationConfig::system_prompt`]; the user prompt
//! always carries the target schema and the document.

/// Default system prompt for the extraction oracle.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You extract structured data from supplier price quotations received by e-mail.
Answer with a single JSON object and nothing else: no Markdown fences, no commentary.
Use numbers (not strings) for quantities, prices and totals. Use an empty string for any text field the document does not state.
Never invent line items that are not in the document."#;

/// Target shape of one bidder record, embedded in every extraction request.
pub const BIDDER_RECORD_SCHEMA: &str = r#"{
    "archivo": "nombre del archivo",
    "empresa": "nombre de la empresa",
    "ruc": "número de RUC",
    "fecha": "fecha de cotización",
    "items": [
        {
            "item": "número de item",
            "descripcion": "descripción del producto",
            "cantidad": número,
            "precio": número decimal
        }
    ],
    "monto_total": suma total
}"#;

/// Build the user message for one offer document.
pub fn extraction_prompt(archivo: &str, html: &str) -> String {
    format!(
        "Analiza el siguiente HTML de una cotización ({archivo}) y extrae la información en formato JSON.\n\
         El JSON debe tener esta estructura:\n{BIDDER_RECORD_SCHEMA}\n\nHTML:\n{html}"
    )
}
