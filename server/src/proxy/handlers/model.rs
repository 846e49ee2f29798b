//! Model Handler
//!
//! Summarization model status and manual reload.

use serde_json::{json, Value};
use tracing::info;

use super::common::{method_not_found, to_result};
use super::HandlerRegistry;
use crate::common::AppResult;

pub fn handle(action: &str, registry: &HandlerRegistry) -> AppResult<Value> {
    match action {
        "status" => to_result(&registry.inference.status()),
        "reload" => {
            let started = registry.inference.reload();
            if started {
                info!("Model reload requested over socket");
            }
            Ok(json!({
                "started": started,
                "status": to_result(&registry.inference.status())?,
            }))
        }
        _ => Err(method_not_found(&format!("model.{}", action))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{call, registry};
    use crate::inference::ModelState;
    use serde_json::json;

    #[tokio::test]
    async fn test_status() {
        let registry = registry(10);
        let resp = call(&registry, "model.status", json!({})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["state"], "unloaded");
        assert_eq!(result["model_name"], "extractive-frequency");
        assert_eq!(result["load_attempts"], 0);
        assert_eq!(result["workers"], 2);
    }

    #[tokio::test]
    async fn test_reload_starts_once() {
        let registry = registry(10);
        let resp = call(&registry, "model.reload", json!({})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["started"], true);
        assert_eq!(result["status"]["load_attempts"], 1);

        assert_eq!(registry.inference().wait_until_settled().await, ModelState::Ready);

        let resp = call(&registry, "model.reload", json!({})).await;
        assert_eq!(resp.result.unwrap()["started"], false);
    }
}
