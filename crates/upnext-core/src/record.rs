//! Normalized output shapes.
//!
//! [`EventRecord`] is the simplified, serializable projection of a
//! provider event. [`ListEventsResult`] is the uniform shape every listing
//! call resolves to: failures are folded into it rather than raised, so a
//! caller always receives `{status, message, events}`.

use serde::{Deserialize, Serialize};

/// A normalized calendar event, ready for display or serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Provider event identifier.
    pub id: String,
    /// Event title; `"Untitled Event"` when the provider has none.
    pub summary: String,
    /// Human-readable start time.
    pub start: String,
    /// Human-readable end time.
    pub end: String,
    /// Event location, empty when absent.
    pub location: String,
    /// Event description, empty when absent.
    pub description: String,
    /// Attendee email addresses.
    pub attendees: Vec<String>,
    /// Link to view the event in the calendar UI.
    pub link: String,
}

/// Outcome of a listing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStatus {
    /// The query ran; `events` holds whatever matched (possibly nothing).
    Success,
    /// The call failed; `message` describes why and `events` is empty.
    Error,
}

/// The uniform shape every event-listing call resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEventsResult {
    /// Whether the call succeeded.
    pub status: ListStatus,
    /// Human-readable outcome description.
    pub message: String,
    /// The matching events; empty on error.
    pub events: Vec<EventRecord>,
}

impl ListEventsResult {
    /// Creates a success result.
    pub fn success(message: impl Into<String>, events: Vec<EventRecord>) -> Self {
        Self {
            status: ListStatus::Success,
            message: message.into(),
            events,
        }
    }

    /// Creates an error result with no events.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ListStatus::Error,
            message: message.into(),
            events: Vec::new(),
        }
    }

    /// Returns true if the call succeeded.
    pub fn is_success(&self) -> bool {
        self.status == ListStatus::Success
    }
}
