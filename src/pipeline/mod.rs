//! Pipeline stages for quotation evaluation.
//!
//! Each stage is a plain function returning a typed `Result`; none of them
//! sees [`crate::state::EvaluationState`]. The orchestrator in
//! [`crate::evaluate`] sequences them and folds their results into the
//! state.
//!
//! ## Data Flow
//!
//! ```text
//! request ──▶ offers ──▶ winner
//! (table)     (oracle)   (min monto_total)
//! ```
//!
//! 1. [`request`] — requested items and date from the procurement request,
//!    using the heuristic [`table`] parser
//! 2. [`offers`]  — discover offer documents and turn each into a
//!    [`crate::record::BidderRecord`] through an [`oracle`]; the only stage
//!    that may do network I/O (via [`llm`]), with [`postprocess`] cleaning
//!    model output before it is parsed
//! 3. [`winner`]  — stable minimum over `monto_total`

pub mod llm;
pub mod offers;
pub mod oracle;
pub mod postprocess;
pub mod request;
pub mod table;
pub mod winner;
