//! `events`: list calendar events from the static events file.

use std::path::Path;

use mmdir_core::{filter_events, load_events, Event, EventFilter};

/// Print events matching `filter` as a table, earliest first.
///
/// An unreadable or malformed file is reported and treated as empty.
pub(crate) fn run_events(path: &Path, filter: &EventFilter) {
    let events = match load_events(path) {
        Ok(events) => events,
        Err(e) => {
            tracing::warn!(error = %e, "could not load events");
            eprintln!("warning: {e}");
            Vec::new()
        }
    };

    let rows = filter_events(&events, filter);
    if rows.is_empty() {
        println!("no events found");
        return;
    }

    for line in event_lines(&rows) {
        println!("{line}");
    }
}

pub(crate) fn event_lines(rows: &[&Event]) -> Vec<String> {
    let mut lines = vec![format!(
        "{:<26}{:<32}{:<24}{:<22}LINK",
        "DATE", "TITLE", "MONASTERY", "LOCALITY"
    )];
    for e in rows {
        let locality = [e.city.as_str(), e.state.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!(
            "{:<26}{:<32}{:<24}{:<22}{}",
            e.date_label(),
            e.title,
            e.temple_name,
            locality,
            e.link.as_deref().unwrap_or("\u{2014}")
        ));
    }
    lines
}
