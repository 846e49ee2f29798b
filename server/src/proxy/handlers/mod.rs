//! Handler Registry and Admission Middleware
//!
//! Every request outside the `server` namespace passes the rate limiter
//! before it is dispatched to its namespace handler.

pub mod calendar;
pub mod common;
pub mod files;
pub mod mail;
pub mod model;
pub mod text;

use std::sync::Arc;
use std::time::Instant;

use briefing_protocol::{JsonRpcRequest, JsonRpcResponse};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::common::AppResult;
use crate::heuristics::text::mask_sensitive;
use crate::inference::{InferenceService, WorkerPool};
use crate::ratelimit::{client_key, RateLimiter};

use self::common::method_not_found;

/// Handler registry - dispatches requests to the namespace handlers
pub struct HandlerRegistry {
    limiter: Arc<RateLimiter>,
    inference: InferenceService,
    /// CPU-bound heuristics run here, off the connection tasks
    helpers: WorkerPool,
    default_max_length: usize,
    started: Instant,
}

impl HandlerRegistry {
    pub fn new(
        limiter: Arc<RateLimiter>,
        inference: InferenceService,
        helpers: WorkerPool,
        default_max_length: usize,
    ) -> Self {
        Self {
            limiter,
            inference,
            helpers,
            default_max_length,
            started: Instant::now(),
        }
    }

    pub fn inference(&self) -> &InferenceService {
        &self.inference
    }

    /// Handle a JSON-RPC request from a peer process
    pub async fn handle(&self, request: &JsonRpcRequest, peer_pid: Option<i32>) -> JsonRpcResponse {
        let id = request.id.clone().unwrap_or(Value::Null);
        let (namespace, action) = request.parse_method();

        if namespace != "server" {
            let key = client_key(&request.params, peer_pid);
            if !self.limiter.is_allowed(&key) {
                warn!(
                    "Rate limit exceeded for client {} on {}",
                    mask_sensitive(&key),
                    request.method
                );
                return JsonRpcResponse::rate_limited(
                    id,
                    self.limiter.max_requests(),
                    self.limiter.window().as_secs(),
                );
            }
        }

        debug!("Handling method: {}", request.method);

        let result = match namespace {
            "text" => text::handle(action, &request.params, self).await,
            "mail" => mail::handle(action, &request.params, self).await,
            "files" => files::handle(action, &request.params, self).await,
            "calendar" => calendar::handle(action, &request.params, self).await,
            "model" => model::handle(action, self),
            "server" => self.handle_server(action),
            _ => Err(method_not_found(&request.method)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                debug!("{} failed: {}", request.method, e);
                e.into_response(id)
            }
        }
    }

    /// Handle server control methods
    fn handle_server(&self, action: &str) -> AppResult<Value> {
        match action {
            "status" => Ok(json!({
                "status": "running",
                "version": env!("CARGO_PKG_VERSION"),
                "uptime_secs": self.started.elapsed().as_secs(),
                "model": common::to_result(&self.inference.status())?,
                "rate_limit": {
                    "max_requests": self.limiter.max_requests(),
                    "window_secs": self.limiter.window().as_secs(),
                    "tracked_keys": self.limiter.tracked_keys(),
                },
            })),
            _ => Err(method_not_found(&format!("server.{}", action))),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::InferenceConfig;
    use crate::inference::ModelState;
    use std::time::Duration;

    pub(crate) fn registry(max_requests: usize) -> HandlerRegistry {
        let inference = InferenceService::from_config(&InferenceConfig::default()).unwrap();
        HandlerRegistry::new(
            Arc::new(RateLimiter::new(max_requests, Duration::from_secs(60))),
            inference,
            WorkerPool::new("helpers", 2).unwrap(),
            150,
        )
    }

    pub(crate) async fn call(registry: &HandlerRegistry, method: &str, params: Value) -> JsonRpcResponse {
        registry
            .handle(&JsonRpcRequest::new(method, params), Some(4242))
            .await
    }

    #[tokio::test]
    async fn test_unknown_namespace() {
        let registry = registry(10);
        let resp = call(&registry, "weather.today", json!({})).await;
        let error = resp.error.unwrap();
        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Method not found: weather.today");
    }

    #[tokio::test]
    async fn test_rate_limit_per_client() {
        let registry = registry(2);
        let params = json!({"text": "hello", "client": "203.0.113.7"});

        assert!(!call(&registry, "text.clean", params.clone()).await.is_error());
        assert!(!call(&registry, "text.clean", params.clone()).await.is_error());

        let resp = call(&registry, "text.clean", params).await;
        let error = resp.error.unwrap();
        assert_eq!(error.code, -32029);
        assert_eq!(error.message, "Too many requests");
        assert_eq!(error.data.unwrap()["max_requests"], 2);

        // another client has its own window
        let other = json!({"text": "hello", "client": "198.51.100.2"});
        assert!(!call(&registry, "text.clean", other).await.is_error());
    }

    #[tokio::test]
    async fn test_peer_pid_is_default_key() {
        let registry = registry(1);
        assert!(!call(&registry, "text.clean", json!({"text": "a"})).await.is_error());
        assert!(call(&registry, "text.clean", json!({"text": "a"})).await.is_error());

        let resp = registry
            .handle(&JsonRpcRequest::new("text.clean", json!({"text": "a"})), Some(7))
            .await;
        assert!(!resp.is_error());
    }

    #[tokio::test]
    async fn test_rejected_request_is_not_dispatched() {
        let registry = registry(0);
        let resp = call(&registry, "model.reload", json!({})).await;
        assert_eq!(resp.error.unwrap().code, -32029);
        assert_eq!(registry.inference().state(), ModelState::Unloaded);
    }

    #[tokio::test]
    async fn test_server_status_is_exempt() {
        let registry = registry(0);
        let resp = call(&registry, "server.status", json!({})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["status"], "running");
        assert_eq!(result["model"]["state"], "unloaded");
        assert_eq!(result["rate_limit"]["max_requests"], 0);
    }

    #[tokio::test]
    async fn test_unknown_server_action() {
        let registry = registry(1);
        let resp = call(&registry, "server.reboot", json!({})).await;
        assert_eq!(resp.error.unwrap().code, -32601);
    }
}
