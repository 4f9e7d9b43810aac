//! Message and code extraction for error normalization.

use serde_json::Value;

use crate::error::ErrorCode;

/// Fallback when nothing better is known.
pub const DEFAULT_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Picks the most human-readable message available.
///
/// Order: the body's `detail` field, its `message` field, the transport's
/// own message, then [`DEFAULT_ERROR_MESSAGE`]. A `detail` holding a list of
/// validation errors is flattened to their `msg` entries.
#[must_use]
pub fn extract_message(body: Option<&Value>, transport_message: Option<&str>) -> String {
    body.and_then(|b| b.get("detail"))
        .and_then(detail_message)
        .or_else(|| {
            body.and_then(|b| b.get("message"))
                .and_then(Value::as_str)
                .and_then(non_blank)
        })
        .or_else(|| transport_message.and_then(non_blank))
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}

/// Extracts the application error code from `code`, then `error_code`.
#[must_use]
pub fn extract_code(body: &Value) -> Option<ErrorCode> {
    ["code", "error_code"]
        .iter()
        .filter_map(|field| body.get(*field))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(ErrorCode::Text(s.clone())),
            Value::Number(n) => n.as_i64().map(ErrorCode::Number),
            _ => None,
        })
}

fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) => non_blank(s),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .filter(|msg| !msg.trim().is_empty())
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
