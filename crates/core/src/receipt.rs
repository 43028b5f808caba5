//! Structured extraction payload returned by the remote service.

use serde::{Deserialize, Serialize};

/// Fields the extraction pipeline parses out of one receipt.
///
/// Every field is best-effort: the OCR/parsing stage fills in what it
/// can and leaves the rest unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub merchant: Option<String>,
    pub total: Option<f64>,
    pub date: Option<String>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub tip: Option<f64>,
    pub discount: Option<f64>,
    pub other_fees: Option<f64>,
    /// Newline-delimited bullet summary, present when AI summarization
    /// was requested at submission time.
    pub summary: Option<String>,
    /// Heuristic category tags, e.g. `HIGH_VALUE` or `FUTURE_DATE`.
    #[serde(default)]
    pub tags: Vec<String>,
    pub raw_text: Option<String>,
}
