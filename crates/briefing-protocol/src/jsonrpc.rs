//! JSON-RPC 2.0 Protocol Types
//!
//! Shared by the `briefingd` socket server and its clients. Messages are
//! newline-delimited JSON objects (or arrays, for batches).

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard and Briefing-specific JSON-RPC error codes
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    pub const RATE_LIMITED: i32 = -32029;
    pub const GENERIC_ERROR: i32 = -32000;
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,

    /// Absent for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,

    /// `namespace.action`, e.g. `text.summarize`
    pub method: String,

    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    /// Build a request with a fresh numeric id
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(Value::from(NEXT_ID.fetch_add(1, Ordering::Relaxed))),
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.jsonrpc != "2.0" {
            return Err("Invalid JSON-RPC version, expected '2.0'".to_string());
        }
        if self.method.is_empty() {
            return Err("Method cannot be empty".to_string());
        }
        Ok(())
    }

    /// Split `namespace.action`; a method without a dot has an empty action
    pub fn parse_method(&self) -> (&str, &str) {
        if let Some((namespace, action)) = self.method.split_once('.') {
            (namespace, action)
        } else {
            (self.method.as_str(), "")
        }
    }
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,

    pub id: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }

    /// Malformed JSON; the id is unknown so it is always null
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::error(Value::Null, codes::PARSE_ERROR, message, None)
    }

    pub fn invalid_request(id: Value, message: impl Into<String>) -> Self {
        Self::error(id, codes::INVALID_REQUEST, message, None)
    }

    /// Admission rejection; `data` carries the quota and window
    pub fn rate_limited(id: Value, max_requests: usize, window_secs: u64) -> Self {
        Self::error(
            id,
            codes::RATE_LIMITED,
            "Too many requests",
            Some(serde_json::json!({
                "max_requests": max_requests,
                "window_secs": window_secs,
            })),
        )
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// JSON-RPC 2.0 Error Object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Parse one line from the socket: a single request or a non-empty batch
pub fn parse_request(input: &str) -> Result<Vec<JsonRpcRequest>, JsonRpcResponse> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(JsonRpcResponse::parse_error("Empty request"));
    }

    if trimmed.starts_with('[') {
        match serde_json::from_str::<Vec<JsonRpcRequest>>(trimmed) {
            Ok(requests) if requests.is_empty() => Err(JsonRpcResponse::invalid_request(
                Value::Null,
                "Empty batch request",
            )),
            Ok(requests) => Ok(requests),
            Err(e) => Err(JsonRpcResponse::parse_error(e.to_string())),
        }
    } else {
        serde_json::from_str::<JsonRpcRequest>(trimmed)
            .map(|request| vec![request])
            .map_err(|e| JsonRpcResponse::parse_error(e.to_string()))
    }
}
