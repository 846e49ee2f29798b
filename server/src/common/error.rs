//! Common Error Types
//!
//! Unified error handling with JSON-RPC error code mapping.

use std::fmt;

use briefing_protocol::{codes, JsonRpcResponse};
use serde_json::Value;

/// JSON-RPC error codes
///
/// Standard codes: -32768 to -32000
/// Custom codes: -32099 to -32000
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Standard JSON-RPC errors
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,

    // Admission control
    RateLimited = -32029,

    // Generic application error
    GenericError = -32000,
}

impl ErrorCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

/// Application error type with JSON-RPC code
#[derive(Debug)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub data: Option<Value>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Missing or malformed request parameter
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Convert into a JSON-RPC error response for the given request id
    pub fn into_response(self, id: Value) -> JsonRpcResponse {
        JsonRpcResponse::error(id, self.code.code(), self.message, self.data)
    }
}

/// Handler result; the registry turns the error side into a JSON-RPC error response
pub type AppResult<T> = Result<T, AppError>;

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<String> for AppError {
    fn from(message: String) -> Self {
        Self::new(ErrorCode::GenericError, message)
    }
}

impl From<&str> for AppError {
    fn from(message: &str) -> Self {
        Self::new(ErrorCode::GenericError, message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorCode::InvalidParams, format!("Invalid params: {}", err))
    }
}

impl From<crate::inference::WorkerError> for AppError {
    fn from(err: crate::inference::WorkerError) -> Self {
        Self::internal(err.to_string())
    }
}

// Keep the shared protocol constants and this enum in lockstep.
const _: () = {
    assert!(ErrorCode::RateLimited as i32 == codes::RATE_LIMITED);
    assert!(ErrorCode::InvalidParams as i32 == codes::INVALID_PARAMS);
    assert!(ErrorCode::MethodNotFound as i32 == codes::METHOD_NOT_FOUND);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_response_carries_code_and_data() {
        let resp = AppError::invalid_params("Missing 'text' parameter")
            .with_data(serde_json::json!({"param": "text"}))
            .into_response(Value::from(3));
        let error = resp.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Missing 'text' parameter");
        assert_eq!(error.data.unwrap()["param"], "text");
        assert_eq!(resp.id, Value::from(3));
    }

    #[test]
    fn test_display() {
        let err: AppError = "boom".into();
        assert_eq!(err.to_string(), "[-32000] boom");
    }
}
