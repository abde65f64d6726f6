//! Provider-shaped event data.
//!
//! [`RawEvent`] is the Calendar API event as parsed from the wire, before
//! it is reshaped into the normalized
//! [`EventRecord`](upnext_core::EventRecord).

use serde::{Deserialize, Serialize};

use upnext_core::EventTime;

/// An attendee of a calendar event.
///
/// Attendee entries without an email address are dropped at parse time,
/// so `email` is always present here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAttendee {
    /// The attendee's email address.
    pub email: String,
}

impl RawAttendee {
    /// Creates a new attendee with the given email.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// A raw calendar event from the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Unique identifier for the event within the provider.
    pub id: String,

    /// When the event starts (datetime or all-day date).
    pub start: EventTime,

    /// When the event ends.
    pub end: EventTime,

    /// The event title/summary.
    pub summary: Option<String>,

    /// The event description.
    pub description: Option<String>,

    /// The event location.
    pub location: Option<String>,

    /// Event attendees that carry an email address.
    pub attendees: Vec<RawAttendee>,

    /// A direct link to view this event in the calendar UI.
    pub html_link: Option<String>,
}

impl RawEvent {
    /// Creates a new raw event with the minimum required fields.
    pub fn new(id: impl Into<String>, start: EventTime, end: EventTime) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            summary: None,
            description: None,
            location: None,
            attendees: Vec::new(),
            html_link: None,
        }
    }

    /// Returns true if this is an all-day event.
    pub fn is_all_day(&self) -> bool {
        self.start.is_all_day()
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the HTML link.
    pub fn with_html_link(mut self, html_link: impl Into<String>) -> Self {
        self.html_link = Some(html_link.into());
        self
    }

    /// Builder method to add an attendee.
    pub fn with_attendee(mut self, attendee: RawAttendee) -> Self {
        self.attendees.push(attendee);
        self
    }
}
