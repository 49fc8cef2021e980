//! Normalization of backend error bodies into one display string.
//!
//! The backend answers failures in several shapes: `{"error": ...}`,
//! `{"detail": "..."}`, FastAPI validation arrays under `detail`, nested
//! objects under `detail`, or `{"message": ...}`.

use serde_json::Value;

/// Turns a raw error response body into a single message.
///
/// Non-JSON bodies are returned trimmed when not empty.
pub fn normalize_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => normalize_error_value(status, &value),
        Err(_) => {
            let text = body.trim();
            if text.is_empty() {
                fallback(status)
            } else {
                text.to_owned()
            }
        }
    }
}

/// Same as [`normalize_error`] for an already decoded body.
pub fn normalize_error_value(status: u16, value: &Value) -> String {
    extract(value)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| fallback(status))
}

fn extract(value: &Value) -> Option<String> {
    let Value::Object(map) = value else {
        return match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        };
    };

    if let Some(Value::String(error)) = map.get("error") {
        return Some(error.clone());
    }

    match map.get("detail") {
        Some(Value::String(detail)) => return Some(detail.clone()),
        Some(Value::Array(items)) if !items.is_empty() => {
            return Some(
                items
                    .iter()
                    .map(describe_detail_item)
                    .collect::<Vec<_>>()
                    .join("; "),
            );
        }
        Some(Value::Object(detail)) => {
            let nested = ["message", "msg", "error"]
                .iter()
                .find_map(|key| detail.get(*key).and_then(Value::as_str));
            return Some(match nested {
                Some(message) => message.to_owned(),
                None => Value::Object(detail.clone()).to_string(),
            });
        }
        _ => {}
    }

    map.get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Renders one FastAPI validation entry as `field: message`.
fn describe_detail_item(item: &Value) -> String {
    let Value::Object(entry) = item else {
        return match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    };

    let message = entry
        .get("msg")
        .or_else(|| entry.get("message"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .unwrap_or_else(|| item.to_string());

    let field = entry
        .get("loc")
        .and_then(Value::as_array)
        .and_then(|loc| loc.last())
        .map(|last| match last {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

    match field {
        Some(field) => format!("{field}: {message}"),
        None => message,
    }
}

fn fallback(status: u16) -> String {
    format!("Request failed with status {status}")
}
