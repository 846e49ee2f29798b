//! Calendar load analysis
//!
//! Every event is counted as one hour of meeting time; start/end are not
//! used for duration.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const LOAD_WARNING: &str = "Consider reducing meeting time - you have over 6 hours of meetings";
pub const DENSITY_WARNING: &str = "High meeting density - consider batching similar meetings";

pub const BUSY_DAY_INSIGHT: &str = "Consider blocking focus time between meetings";
pub const BALANCED_DAY_INSIGHT: &str = "Good meeting balance today";
pub const MORNING_FOCUS_SUGGESTION: &str = "Morning focus block - great for deep work";
pub const FOCUS_RECOMMENDATIONS: [&str; 3] = [
    "Block 2-hour chunks for deep work",
    "Avoid scheduling meetings during your peak energy hours",
    "Use the Pomodoro technique during focus blocks",
];

const HOURS_PER_EVENT: f64 = 1.0;
const BUSY_DAY_MEETINGS: usize = 4;
const WORKDAY_START_HOUR: u32 = 9;
const MIN_FOCUS_MINUTES: i64 = 60;
const LOAD_THRESHOLD_HOURS: f64 = 6.0;
const DENSITY_THRESHOLD: usize = 8;

static MEETING_LINKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"https://[a-zA-Z0-9.-]+\.zoom\.us/[^\s]+",
        r"https://meet\.google\.com/[^\s]+",
        r"https://teams\.microsoft\.com/[^\s]+",
        r"https://[a-zA-Z0-9.-]+\.webex\.com/[^\s]+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("meeting link pattern"))
    .collect()
});

/// Calendar event as delivered by the calendar collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: String,
    /// RFC 3339 timestamp, or `YYYY-MM-DD` for all-day events
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub attendees: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyResult {
    pub total_meetings: usize,
    pub estimated_meeting_hours: f64,
    pub suggestions: Vec<String>,
}

pub fn analyze_calendar_efficiency(events: &[CalendarEvent]) -> EfficiencyResult {
    if events.is_empty() {
        return EfficiencyResult {
            total_meetings: 0,
            estimated_meeting_hours: 0.0,
            suggestions: Vec::new(),
        };
    }

    let total_meetings = events.len();
    let estimated_meeting_hours = total_meetings as f64 * HOURS_PER_EVENT;

    let mut suggestions = Vec::new();
    if estimated_meeting_hours > LOAD_THRESHOLD_HOURS {
        suggestions.push(LOAD_WARNING.to_string());
    }
    if total_meetings > DENSITY_THRESHOLD {
        suggestions.push(DENSITY_WARNING.to_string());
    }

    EfficiencyResult {
        total_meetings,
        estimated_meeting_hours,
        suggestions,
    }
}

/// Uninterrupted stretch before the day's first meeting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusBlock {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub duration_hours: f64,
    pub suggestion: String,
}

/// Readable one-liners about the day's meeting load
pub fn day_insights(today_meetings: usize, total_meetings: usize) -> Vec<String> {
    let balance = if today_meetings > BUSY_DAY_MEETINGS {
        BUSY_DAY_INSIGHT
    } else {
        BALANCED_DAY_INSIGHT
    };
    vec![
        format!("You have {} meetings scheduled for today", today_meetings),
        format!("There are {} meetings on this calendar", total_meetings),
        balance.to_string(),
    ]
}

/// Focus block from 09:00 to the first timed meeting on `today`, when that
/// leaves more than an hour. Times are in the first meeting's offset;
/// all-day events are ignored.
pub fn morning_focus_block(events: &[CalendarEvent], today: NaiveDate) -> Option<FocusBlock> {
    let first = events
        .iter()
        .filter_map(|e| DateTime::parse_from_rfc3339(&e.start).ok())
        .filter(|start| start.date_naive() == today)
        .min()?;

    let nine = NaiveTime::from_hms_opt(WORKDAY_START_HOUR, 0, 0)?;
    let morning = first
        .offset()
        .from_local_datetime(&today.and_time(nine))
        .single()?;

    let gap = first - morning;
    if gap <= Duration::minutes(MIN_FOCUS_MINUTES) {
        return None;
    }

    Some(FocusBlock {
        start: morning,
        end: first,
        duration_hours: gap.num_seconds() as f64 / 3600.0,
        suggestion: MORNING_FOCUS_SUGGESTION.to_string(),
    })
}

/// First video-meeting link in an event description
pub fn extract_meeting_link(description: &str) -> Option<String> {
    MEETING_LINKS
        .iter()
        .find_map(|re| re.find(description))
        .map(|m| m.as_str().to_string())
}

/// Whether an event start falls on `today` (in the event's own offset)
pub fn is_today(start: &str, today: NaiveDate) -> bool {
    if let Ok(dt) = DateTime::parse_from_rfc3339(start) {
        return dt.date_naive() == today;
    }
    NaiveDate::parse_from_str(start, "%Y-%m-%d")
        .map(|date| date == today)
        .unwrap_or(false)
}

/// Focus score from today's meeting count
pub fn productivity_score(today_meetings: usize) -> u8 {
    match today_meetings {
        0 => 100,
        1..=3 => 80,
        4..=6 => 60,
        _ => 30,
    }
}
