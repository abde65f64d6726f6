//! Projection of raw provider events into normalized records.
//!
//! Raw events keep the provider's shape (typed times, optional fields);
//! [`record_from_raw`] flattens them into the display-ready
//! [`EventRecord`] with defaults filled in and times rendered as text.

use upnext_core::{EventRecord, EventTime};

use crate::raw_event::RawEvent;

/// Summary used when the provider has no title for an event.
pub const UNTITLED_SUMMARY: &str = "Untitled Event";

/// Renders an event time as a human-readable string.
///
/// All-day events render as `"YYYY-MM-DD (All day)"`. Timed events use a
/// 12-hour clock, e.g. `"2024-06-15 10:30 AM"`.
pub fn format_event_time(time: &EventTime) -> String {
    match time {
        EventTime::AllDay(date) => format!("{} (All day)", date.format("%Y-%m-%d")),
        EventTime::DateTime(dt) => dt.format("%Y-%m-%d %I:%M %p").to_string(),
    }
}

/// Flattens a raw provider event into a normalized record.
///
/// Missing summaries become [`UNTITLED_SUMMARY`], missing location,
/// description, and link become empty strings, and attendees are reduced
/// to their email addresses.
pub fn record_from_raw(raw: &RawEvent) -> EventRecord {
    EventRecord {
        id: raw.id.clone(),
        summary: raw
            .summary
            .clone()
            .unwrap_or_else(|| UNTITLED_SUMMARY.to_string()),
        start: format_event_time(&raw.start),
        end: format_event_time(&raw.end),
        location: raw.location.clone().unwrap_or_default(),
        description: raw.description.clone().unwrap_or_default(),
        attendees: raw.attendees.iter().map(|a| a.email.clone()).collect(),
        link: raw.html_link.clone().unwrap_or_default(),
    }
}
