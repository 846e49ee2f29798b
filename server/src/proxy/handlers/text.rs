//! Text Handler
//!
//! Summarization, action-item extraction and cleanup for free text.

use serde_json::{json, Value};

use super::common::{length_with_default, method_not_found, require_string, to_result};
use super::HandlerRegistry;
use crate::common::AppResult;
use crate::heuristics::clean_text;

pub async fn handle(action: &str, params: &Value, registry: &HandlerRegistry) -> AppResult<Value> {
    match action {
        "summarize" => handle_summarize(params, registry).await,
        "tasks" | "extractTasks" => handle_tasks(params, registry).await,
        "clean" => handle_clean(params, registry).await,
        _ => Err(method_not_found(&format!("text.{}", action))),
    }
}

async fn handle_summarize(params: &Value, registry: &HandlerRegistry) -> AppResult<Value> {
    let text = require_string(params, "text")?;
    let max_length = length_with_default(params, "max_length", registry.default_max_length)?;

    let result = registry.inference.summarize(text, max_length).await;
    to_result(&result)
}

async fn handle_tasks(params: &Value, registry: &HandlerRegistry) -> AppResult<Value> {
    let text = require_string(params, "text")?.to_string();
    let inference = registry.inference.clone();

    let tasks = registry
        .helpers
        .submit(move || inference.extract_tasks(&text))
        .join()
        .await?;

    Ok(json!({ "tasks": tasks }))
}

async fn handle_clean(params: &Value, registry: &HandlerRegistry) -> AppResult<Value> {
    let text = require_string(params, "text")?.to_string();
    let cleaned = registry.helpers.submit(move || clean_text(&text)).join().await?;
    Ok(json!({ "text": cleaned }))
}
