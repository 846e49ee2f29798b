//! Action-item extraction
//!
//! Pattern-based, deterministic, no model involved.

use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_TASKS: usize = 5;

/// Minimum trimmed length (exclusive) for a match to count as a task
const MIN_TASK_CHARS: usize = 10;

/// Evaluated in order; earlier patterns take priority.
static TASK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // requests and obligations
        r"(?i)(?:please|can you|could you|need to|have to|must|should)\s+([^.!?]+)",
        // explicit markers
        r"(?i)(?:action item|todo|task|follow up):\s*([^.!?]+)",
        // deadlines
        r"(?i)(?:by|before|until)\s+\w+day[^.!?]*",
        // scheduling
        r"(?i)(?:schedule|book|arrange|set up|organize)\s+([^.!?]+)",
        // review requests
        r"(?i)(?:review|check|verify|confirm|update)\s+([^.!?]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("task pattern"))
    .collect()
});

/// Up to [`MAX_TASKS`] distinct action items found in `text`.
///
/// A pattern's capture group is the task when it has one, otherwise the
/// whole match is.
pub fn extract_tasks(text: &str) -> Vec<String> {
    let mut tasks: Vec<String> = Vec::new();

    for pattern in TASK_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let Some(m) = caps.get(1).or_else(|| caps.get(0)) else {
                continue;
            };
            let task = m.as_str().trim();
            if task.chars().count() > MIN_TASK_CHARS && !tasks.iter().any(|t| t == task) {
                tasks.push(task.to_string());
            }
        }
    }

    tasks.truncate(MAX_TASKS);
    tasks
}
