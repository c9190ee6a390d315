//! Tool-call extraction from raw model output
//!
//! Model text is unreliable, so nothing in here fails: unparseable output
//! yields an empty result carrying the raw text, and malformed entries are
//! skipped one by one.

use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{FunctionCall, InferResponse};

/// Turn raw engine output into an [`InferResponse`].
pub fn extract(raw_text: &str) -> InferResponse {
    let parsed = match serde_json::from_str::<Value>(raw_text) {
        Ok(Value::Object(object)) => object,
        Ok(_) => {
            debug!("Model output is JSON but not an object");
            return degraded(raw_text);
        }
        Err(e) => {
            debug!("Model output is not JSON: {}", e);
            return degraded(raw_text);
        }
    };

    let function_calls = match parsed.get("function_calls") {
        Some(Value::Array(items)) => items.iter().filter_map(function_call).collect(),
        _ => Vec::new(),
    };

    InferResponse {
        function_calls,
        confidence: number(&parsed, "confidence"),
        total_time_in_ms: number(&parsed, "total_time_ms"),
        raw_text: Some(raw_text.to_string()),
    }
}

fn degraded(raw_text: &str) -> InferResponse {
    InferResponse {
        function_calls: Vec::new(),
        confidence: 0.0,
        total_time_in_ms: 0.0,
        raw_text: Some(raw_text.to_string()),
    }
}

/// One candidate entry; any type mismatch discards the whole entry.
fn function_call(item: &Value) -> Option<FunctionCall> {
    let entry = item.as_object()?;
    let name = entry.get("name")?.as_str()?;
    let arguments = match entry.get("arguments") {
        None => Map::new(),
        Some(Value::Object(arguments)) => arguments.clone(),
        Some(_) => return None,
    };

    Some(FunctionCall {
        name: name.to_string(),
        arguments,
    })
}

/// Numbers and booleans (as 1.0/0.0) are accepted; anything else is 0.0.
fn number(object: &Map<String, Value>, key: &str) -> f64 {
    match object.get(key) {
        Some(Value::Bool(flag)) => f64::from(u8::from(*flag)),
        Some(value) => value.as_f64().unwrap_or(0.0),
        None => 0.0,
    }
}
