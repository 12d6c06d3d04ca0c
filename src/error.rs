//! Error display normalization.
//!
//! Transport errors arrive in whatever shape the upstream produced: a
//! native error, a plain string, or a structured JSON payload that may
//! itself wrap another JSON error body. [`normalize_error`] reduces any
//! of them to one short display string. Every fallback here is local;
//! nothing in this module fails outward.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Transport-provided error of unknown shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorValue {
    /// A plain message, e.g. the display output of a native error.
    Message(String),
    /// A structured or semi-structured JSON value.
    Json(Value),
}

impl ErrorValue {
    /// Capture a native error's display output.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        ErrorValue::Message(err.to_string())
    }
}

impl From<String> for ErrorValue {
    fn from(message: String) -> Self {
        ErrorValue::Message(message)
    }
}

impl From<&str> for ErrorValue {
    fn from(message: &str) -> Self {
        ErrorValue::Message(message.to_string())
    }
}

impl From<Value> for ErrorValue {
    fn from(value: Value) -> Self {
        ErrorValue::Json(value)
    }
}

/// Widest `{...}` span inside a candidate string.
static JSON_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{.*\}").expect("valid regex"));

/// Reduce an error value to a short display string, or `None` when the
/// input denotes "no error".
pub fn normalize_error(error: Option<&ErrorValue>) -> Option<String> {
    let candidate = match error? {
        ErrorValue::Message(message) => message.clone(),
        ErrorValue::Json(Value::Null) => return None,
        ErrorValue::Json(value) => candidate_from_json(value),
    };
    Some(refine_candidate(candidate))
}

fn candidate_from_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(message)) = map.get("message") {
                if !message.is_empty() {
                    return message.clone();
                }
            }
            if let Some(Value::String(message)) = map.get("error") {
                if !message.is_empty() {
                    return message.clone();
                }
            }
            serde_json::to_string(value).unwrap_or_default()
        }
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

/// Best-effort refinement: API errors often arrive as prose wrapping a
/// JSON body whose `error` field carries the user-facing message.
/// Match/parse failure keeps the original candidate.
fn refine_candidate(candidate: String) -> String {
    let Some(span) = JSON_SPAN.find(&candidate) else {
        return candidate;
    };
    let Ok(parsed) = serde_json::from_str::<Value>(span.as_str()) else {
        return candidate;
    };
    match parsed.get("error") {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        _ => candidate,
    }
}
