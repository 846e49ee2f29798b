//! Mail Handler
//!
//! Builds a digest for a batch of messages already fetched by the mail
//! collaborator: a summary per message plus the action items, addresses and
//! links found in its body.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::common::{length_with_default, method_not_found, require_param, to_result};
use super::HandlerRegistry;
use crate::common::AppResult;
use crate::heuristics::text::{clean_text, extract_email_addresses, extract_urls, text_similarity};
use crate::heuristics::{extract_tasks, MailMessage};

/// Bodies at least this similar to an earlier message are flagged as duplicates
const DUPLICATE_SIMILARITY: f64 = 0.8;

#[derive(Debug, Serialize)]
struct MessageDigest {
    id: String,
    subject: String,
    sender: String,
    summary: String,
    confidence_score: f64,
    tasks: Vec<String>,
    addresses: Vec<String>,
    links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duplicate_of: Option<String>,
}

#[derive(Debug, Serialize)]
struct Digest {
    messages: Vec<MessageDigest>,
    total_messages: usize,
    total_tasks: usize,
    duplicates: usize,
}

struct Extracted {
    cleaned: String,
    tasks: Vec<String>,
    addresses: Vec<String>,
    links: Vec<String>,
}

pub async fn handle(action: &str, params: &Value, registry: &HandlerRegistry) -> AppResult<Value> {
    match action {
        "digest" => handle_digest(params, registry).await,
        _ => Err(method_not_found(&format!("mail.{}", action))),
    }
}

async fn handle_digest(params: &Value, registry: &HandlerRegistry) -> AppResult<Value> {
    let messages: Vec<MailMessage> = require_param(params, "messages")?;
    let max_length = length_with_default(params, "max_length", registry.default_max_length)?;

    let mut digests: Vec<MessageDigest> = Vec::with_capacity(messages.len());
    let mut cleaned_bodies: Vec<String> = Vec::with_capacity(messages.len());

    for message in messages {
        let body = message.body.clone();
        let extracted = registry
            .helpers
            .submit(move || Extracted {
                cleaned: clean_text(&body),
                tasks: extract_tasks(&body),
                addresses: extract_email_addresses(&body),
                links: extract_urls(&body),
            })
            .join()
            .await?;

        let duplicate_of = digests
            .iter()
            .zip(&cleaned_bodies)
            .find(|(_, earlier)| {
                !extracted.cleaned.is_empty()
                    && text_similarity(earlier, &extracted.cleaned) >= DUPLICATE_SIMILARITY
            })
            .map(|(d, _)| d.id.clone());

        let summary = registry.inference.summarize(&message.body, max_length).await;

        digests.push(MessageDigest {
            id: message.id,
            subject: message.subject,
            sender: message.sender,
            summary: summary.summary,
            confidence_score: summary.confidence_score,
            tasks: extracted.tasks,
            addresses: extracted.addresses,
            links: extracted.links,
            duplicate_of,
        });
        cleaned_bodies.push(extracted.cleaned);
    }

    let digest = Digest {
        total_messages: digests.len(),
        total_tasks: digests.iter().map(|d| d.tasks.len()).sum(),
        duplicates: digests.iter().filter(|d| d.duplicate_of.is_some()).count(),
        messages: digests,
    };
    debug!(
        messages = digest.total_messages,
        tasks = digest.total_tasks,
        "mail digest built"
    );

    to_result(&digest)
}
