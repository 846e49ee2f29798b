//! Common Handler Utilities
//!
//! Shared parameter extraction and result conversion.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::common::{AppError, AppResult, ErrorCode};

// ────────────────────────────────────────────────────────────────────────────
// Parameter Extraction Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Extract a required string parameter
pub fn require_string<'a>(params: &'a Value, key: &str) -> AppResult<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::invalid_params(format!("Missing '{}' parameter", key)))
}

/// Extract an optional string parameter
pub fn optional_string<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

/// Extract a positive length parameter with a default value
pub fn length_with_default(params: &Value, key: &str, default: usize) -> AppResult<usize> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => match v.as_u64() {
            Some(n) if n > 0 => Ok(n as usize),
            _ => Err(AppError::invalid_params(format!(
                "'{}' must be a positive integer",
                key
            ))),
        },
    }
}

/// Deserialize a required structured parameter
pub fn require_param<T: DeserializeOwned>(params: &Value, key: &str) -> AppResult<T> {
    let value = params
        .get(key)
        .ok_or_else(|| AppError::invalid_params(format!("Missing '{}' parameter", key)))?;
    serde_json::from_value(value.clone())
        .map_err(|e| AppError::invalid_params(format!("Invalid '{}' parameter: {}", key, e)))
}

// ────────────────────────────────────────────────────────────────────────────
// Response Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Serialize a handler result
pub fn to_result<T: Serialize>(value: &T) -> AppResult<Value> {
    serde_json::to_value(value).map_err(|e| AppError::internal(format!("Serialization failed: {}", e)))
}

pub fn method_not_found(method: &str) -> AppError {
    AppError::new(ErrorCode::MethodNotFound, format!("Method not found: {}", method))
}
