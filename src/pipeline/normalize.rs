//! Reply normalization: fence stripping followed by a strict JSON parse.
//!
//! Purely textual. A reply that is not valid JSON after the fence is removed
//! is reported as malformed; no brace balancing or comma repair is attempted.

use serde_json::Value;

/// A reply that did not parse after fence stripping.
#[derive(Debug, Clone, thiserror::Error)]
#[error("malformed model reply: {error}")]
pub struct NormalizeError {
    /// The reply exactly as received
    pub raw: String,
    /// The reply after fence stripping
    pub cleaned: String,
    /// Parser message
    pub error: String,
}

/// Remove one leading ```` ```json ```` or ```` ``` ```` fence and one trailing
/// ```` ``` ````, trimming surrounding whitespace.
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Strip the fence and parse what remains.
pub fn parse_reply(raw: &str) -> Result<Value, NormalizeError> {
    let cleaned = strip_code_fence(raw);
    serde_json::from_str::<Value>(cleaned).map_err(|e| NormalizeError {
        raw: raw.to_string(),
        cleaned: cleaned.to_string(),
        error: e.to_string(),
    })
}
