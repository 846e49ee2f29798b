//! Rule-based file categorization

use serde::Serialize;

pub const RESUME: &str = "Resume/CV";
pub const REPORT: &str = "Report";
pub const LEGAL: &str = "Legal Document";
pub const DOCUMENT: &str = "Document";
pub const IMAGE: &str = "Image";
pub const SPREADSHEET: &str = "Spreadsheet";
pub const PRESENTATION: &str = "Presentation";
pub const OTHER: &str = "Other";

/// Extension groups, checked in order; the first group with a hit wins.
const GROUPS: &[(&[&str], &str)] = &[
    (&[".pdf", ".doc", ".docx"], DOCUMENT),
    (&[".jpg", ".png", ".gif", ".jpeg"], IMAGE),
    (&[".xlsx", ".xls", ".csv"], SPREADSHEET),
    (&[".ppt", ".pptx"], PRESENTATION),
];

/// Keyword refinements for the document group, checked in order.
const DOCUMENT_KINDS: &[(&[&str], &str)] = &[
    (&["resume", "cv"], RESUME),
    (&["report", "analysis"], REPORT),
    (&["contract", "agreement"], LEGAL),
];

/// Category label for a file name. Case-insensitive substring matching on
/// the name only.
pub fn categorize_file(filename: &str) -> &'static str {
    let name = filename.to_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|n| name.contains(n));

    let Some(&(_, category)) = GROUPS.iter().find(|(exts, _)| contains_any(*exts)) else {
        return OTHER;
    };

    if category != DOCUMENT {
        return category;
    }

    DOCUMENT_KINDS
        .iter()
        .find(|(words, _)| contains_any(*words))
        .map(|&(_, kind)| kind)
        .unwrap_or(DOCUMENT)
}

/// Folder suggestion for one file
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationSuggestion {
    pub file_id: Option<String>,
    pub file_name: String,
    pub suggested_folder: &'static str,
    pub reason: String,
}

pub const ORGANIZATION_TIPS: [&str; 3] = [
    "Create folders for each category (Documents, Images, Spreadsheets)",
    "Use consistent naming conventions",
    "Archive old files to reduce clutter",
];

pub fn organization_suggestion(file_id: Option<String>, file_name: &str) -> OrganizationSuggestion {
    let category = categorize_file(file_name);
    OrganizationSuggestion {
        file_id,
        file_name: file_name.to_string(),
        suggested_folder: category,
        reason: format!(
            "File appears to be a {} based on name and type",
            category.to_lowercase()
        ),
    }
}
