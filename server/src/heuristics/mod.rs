//! Deterministic heuristics
//!
//! Text cleanup, action-item extraction, file categorization and calendar
//! load analysis. None of these depend on the summarization model, so they
//! are always available.

pub mod calendar;
pub mod files;
pub mod tasks;
pub mod text;

use serde::{Deserialize, Serialize};

pub use calendar::{analyze_calendar_efficiency, CalendarEvent, EfficiencyResult};
pub use files::categorize_file;
pub use tasks::extract_tasks;
pub use text::clean_text;

/// Mail message as delivered by the mail collaborator, body already extracted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub sender: String,
    /// Plain-text or HTML body
    #[serde(default)]
    pub body: String,
}

/// File metadata as delivered by the file-storage collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub mime_type: String,
    /// Size in bytes; absent for native documents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<String>,
}
