//! Files Handler
//!
//! Categorization and folder suggestions for file listings supplied by the
//! file-storage collaborator. Only names are inspected, never contents.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};

use super::common::{method_not_found, optional_string, require_param, to_result};
use super::HandlerRegistry;
use crate::common::AppResult;
use crate::heuristics::files::{organization_suggestion, OrganizationSuggestion, ORGANIZATION_TIPS};
use crate::heuristics::text::format_file_size;
use crate::heuristics::FileRecord;

#[derive(Debug, Serialize)]
struct CategorizedFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    name: String,
    category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified_time: Option<String>,
}

pub async fn handle(action: &str, params: &Value, registry: &HandlerRegistry) -> AppResult<Value> {
    match action {
        "categorize" => handle_categorize(params, registry).await,
        "organize" => handle_organize(params),
        _ => Err(method_not_found(&format!("files.{}", action))),
    }
}

async fn handle_categorize(params: &Value, registry: &HandlerRegistry) -> AppResult<Value> {
    if let Some(filename) = optional_string(params, "filename") {
        return Ok(json!({
            "filename": filename,
            "category": registry.inference.categorize_file(filename),
        }));
    }

    let files: Vec<FileRecord> = require_param(params, "files")?;
    let inference = registry.inference.clone();

    let (records, summary) = registry
        .helpers
        .submit(move || {
            let mut summary: BTreeMap<&'static str, usize> = BTreeMap::new();
            let records: Vec<CategorizedFile> = files
                .into_iter()
                .map(|file| {
                    let category = inference.categorize_file(&file.name);
                    *summary.entry(category).or_insert(0) += 1;
                    CategorizedFile {
                        id: file.id,
                        name: file.name,
                        category,
                        size: file.size.map(format_file_size),
                        modified_time: file.modified_time,
                    }
                })
                .collect();
            (records, summary)
        })
        .join()
        .await?;

    Ok(json!({
        "total": records.len(),
        "files": to_result(&records)?,
        "categories": summary,
    }))
}

fn handle_organize(params: &Value) -> AppResult<Value> {
    let files: Vec<FileRecord> = require_param(params, "files")?;

    let suggestions: Vec<OrganizationSuggestion> = files
        .into_iter()
        .map(|file| organization_suggestion(file.id, &file.name))
        .collect();

    Ok(json!({
        "suggestions": to_result(&suggestions)?,
        "tips": ORGANIZATION_TIPS,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{call, registry};
    use serde_json::json;

    #[tokio::test]
    async fn test_categorize_single_name() {
        let registry = registry(10);
        let resp = call(&registry, "files.categorize", json!({"filename": "Q3_Report.docx"})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["category"], "Report");
    }

    #[tokio::test]
    async fn test_categorize_listing() {
        let registry = registry(10);
        let resp = call(
            &registry,
            "files.categorize",
            json!({"files": [
                {"id": "f1", "name": "resume_2024.pdf", "size": 1536},
                {"id": "f2", "name": "vacation.png"},
                {"id": "f3", "name": "headshot.jpg", "modified_time": "2024-03-01T10:00:00Z"}
            ]}),
        )
        .await;

        let result = resp.result.unwrap();
        assert_eq!(result["total"], 3);
        assert_eq!(result["files"][0]["category"], "Resume/CV");
        assert_eq!(result["files"][0]["size"], "1.5 KB");
        assert!(result["files"][1].get("size").is_none());
        assert_eq!(result["categories"], json!({"Image": 2, "Resume/CV": 1}));
    }

    #[tokio::test]
    async fn test_categorize_requires_input() {
        let registry = registry(10);
        let resp = call(&registry, "files.categorize", json!({})).await;
        assert_eq!(resp.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_organize() {
        let registry = registry(10);
        let resp = call(
            &registry,
            "files.organize",
            json!({"files": [{"id": "f9", "name": "vendor_agreement.pdf"}]}),
        )
        .await;

        let result = resp.result.unwrap();
        let suggestion = &result["suggestions"][0];
        assert_eq!(suggestion["file_id"], "f9");
        assert_eq!(suggestion["suggested_folder"], "Legal Document");
        assert_eq!(
            suggestion["reason"],
            "File appears to be a legal document based on name and type"
        );
        assert_eq!(result["tips"].as_array().unwrap().len(), 3);
    }
}
