//! Calendar Handler
//!
//! Meeting-load analysis over events supplied by the calendar collaborator.

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::Value;

use super::common::{method_not_found, optional_string, require_param, to_result};
use super::HandlerRegistry;
use crate::common::{AppError, AppResult};
use crate::heuristics::calendar::{
    day_insights, extract_meeting_link, is_today, morning_focus_block, productivity_score, FocusBlock,
    FOCUS_RECOMMENDATIONS,
};
use crate::heuristics::{CalendarEvent, EfficiencyResult};

#[derive(Debug, Serialize)]
struct MeetingLink {
    event_id: String,
    summary: String,
    link: String,
}

#[derive(Debug, Serialize)]
struct Insights {
    efficiency: EfficiencyResult,
    today: NaiveDate,
    today_meetings: usize,
    productivity_score: u8,
    insights: Vec<String>,
    focus_blocks: Vec<FocusBlock>,
    meeting_links: Vec<MeetingLink>,
}

#[derive(Debug, Serialize)]
struct FocusTime {
    focus_blocks: Vec<FocusBlock>,
    recommendations: Vec<&'static str>,
}

pub async fn handle(action: &str, params: &Value, registry: &HandlerRegistry) -> AppResult<Value> {
    match action {
        "efficiency" => {
            let events: Vec<CalendarEvent> = require_param(params, "events")?;
            to_result(&registry.inference.analyze_calendar_efficiency(&events))
        }
        "insights" => handle_insights(params, registry),
        "focus_time" | "focusTime" => handle_focus_time(params),
        _ => Err(method_not_found(&format!("calendar.{}", action))),
    }
}

/// `today` param as `YYYY-MM-DD`, else the local date
fn today_param(params: &Value) -> AppResult<NaiveDate> {
    match optional_string(params, "today") {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| AppError::invalid_params(format!("Invalid 'today' parameter: {}", e))),
        None => Ok(Local::now().date_naive()),
    }
}

fn handle_focus_time(params: &Value) -> AppResult<Value> {
    let events: Vec<CalendarEvent> = require_param(params, "events")?;
    let today = today_param(params)?;

    to_result(&FocusTime {
        focus_blocks: morning_focus_block(&events, today).into_iter().collect(),
        recommendations: FOCUS_RECOMMENDATIONS.to_vec(),
    })
}

fn handle_insights(params: &Value, registry: &HandlerRegistry) -> AppResult<Value> {
    let events: Vec<CalendarEvent> = require_param(params, "events")?;
    let today = today_param(params)?;

    let today_meetings = events.iter().filter(|e| is_today(&e.start, today)).count();

    let meeting_links = events
        .iter()
        .filter_map(|event| {
            let link = event
                .description
                .as_deref()
                .and_then(extract_meeting_link)
                .or_else(|| event.location.as_deref().and_then(extract_meeting_link))?;
            Some(MeetingLink {
                event_id: event.id.clone(),
                summary: event.summary.clone(),
                link,
            })
        })
        .collect();

    to_result(&Insights {
        efficiency: registry.inference.analyze_calendar_efficiency(&events),
        today,
        today_meetings,
        productivity_score: productivity_score(today_meetings),
        insights: day_insights(today_meetings, events.len()),
        focus_blocks: morning_focus_block(&events, today).into_iter().collect(),
        meeting_links,
    })
}
