//! Calendar events read from a static JSON file.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::filter::normalize_text;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub temple_name: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub address: String,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub date_start: String,
    #[serde(default)]
    pub date_end: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl Event {
    /// `start → end` for multi-day events, otherwise just the start date.
    #[must_use]
    pub fn date_label(&self) -> String {
        if !self.date_end.is_empty() && self.date_end != self.date_start {
            format!("{} \u{2192} {}", self.date_start, self.date_end)
        } else {
            self.date_start.clone()
        }
    }

    fn starts_or_ends_in(&self, month: u32) -> bool {
        [&self.date_start, &self.date_end]
            .iter()
            .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .any(|d| d.month() == month)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub text: Option<String>,
    /// 1-based calendar month.
    pub month: Option<u32>,
    /// Exact state/region name.
    pub state: Option<String>,
}

impl EventFilter {
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        let needle = self.text.as_deref().map(normalize_text).unwrap_or_default();
        let text_ok = needle.is_empty()
            || [&event.title, &event.temple_name, &event.city, &event.state]
                .iter()
                .any(|field| normalize_text(field).contains(&needle));
        let month_ok = self.month.is_none_or(|m| event.starts_or_ends_in(m));
        let state_ok = self.state.as_deref().is_none_or(|s| event.state == s);
        text_ok && month_ok && state_ok
    }
}

/// Load the events list.
///
/// # Errors
///
/// Returns [`ConfigError::FileIo`] or [`ConfigError::FileParse`]. Callers
/// typically log the error and continue with an empty list.
pub fn load_events(path: &Path) -> Result<Vec<Event>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let events: Vec<Event> =
        serde_json::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;
    tracing::debug!(path = %path.display(), count = events.len(), "loaded events");
    Ok(events)
}

/// Events passing `filter`, ascending by start date.
#[must_use]
pub fn filter_events<'a>(events: &'a [Event], filter: &EventFilter) -> Vec<&'a Event> {
    let mut rows: Vec<&Event> = events.iter().filter(|e| filter.matches(e)).collect();
    rows.sort_by(|a, b| a.date_start.cmp(&b.date_start));
    rows
}
