//! Normalization of upstream response bodies.
//!
//! The backend is loose about envelopes: lists come bare or under `data`,
//! mutations may answer with nothing, plain text or JSON.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::errors::ProxyError;

/// Body of a successful mutation as a JSON value.
pub fn normalize_mutation_body(bytes: &[u8]) -> Value {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return json!({ "success": true });
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(v) => v,
        Err(_) => json!({ "success": true, "message": trimmed }),
    }
}

fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

pub fn extract_items<T: DeserializeOwned>(value: Value) -> Result<Vec<T>, ProxyError> {
    match unwrap_data(value) {
        Value::Null => Ok(Vec::new()),
        arr @ Value::Array(_) => {
            serde_json::from_value(arr).map_err(|e| ProxyError::Decode(e.to_string()))
        }
        other => Err(ProxyError::Decode(format!("expected a list, got {}", type_name(&other)))),
    }
}

pub fn extract_entity<T: DeserializeOwned>(value: Value) -> Result<T, ProxyError> {
    serde_json::from_value(unwrap_data(value)).map_err(|e| ProxyError::Decode(e.to_string()))
}

/// Best human-readable message out of an error body.
pub fn error_message(status: u16, bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text) {
        for key in ["message", "error", "detail"] {
            if let Some(Value::String(s)) = map.get(key) {
                return s.clone();
            }
        }
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        format!("upstream returned status {status}")
    } else {
        trimmed.chars().take(512).collect()
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
