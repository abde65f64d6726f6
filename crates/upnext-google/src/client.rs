//! Google Calendar API client.
//!
//! A low-level HTTP client for the Calendar API v3 `events.list`
//! endpoint, bound to one access token. The query is a single page:
//! recurring events are expanded server-side, results are ordered by
//! start time, and the result count is capped by `max_results` with no
//! follow-up page requests.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use upnext_core::{EventTime, TimeWindow};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{RawAttendee, RawEvent};
use crate::source::{BoxFuture, EventSource};

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar API client bound to an access token.
#[derive(Debug)]
pub struct CalendarClient {
    http_client: reqwest::Client,
    access_token: String,
}

impl CalendarClient {
    /// Creates a new client with the given access token and timeout.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            access_token: access_token.into(),
        })
    }

    /// Lists events from a calendar whose start falls inside the window.
    ///
    /// Issues exactly one `events.list` query with `singleEvents=true`
    /// (recurring events expanded into instances), ordered by start time
    /// ascending, capped at `max_results`.
    pub async fn list_events_in_window(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
        max_results: usize,
    ) -> ProviderResult<Vec<RawEvent>> {
        let url = format!(
            "{}/calendars/{}/events",
            CALENDAR_API_BASE,
            urlencoding::encode(calendar_id)
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("timeMin", window.start.to_rfc3339()),
                ("timeMax", window.end.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", max_results.to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::network("request timeout")
                } else if e.is_connect() {
                    ProviderError::network(format!("connection failed: {}", e))
                } else {
                    ProviderError::network(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::authentication(
                "access token expired or invalid",
            ));
        }

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ProviderError::authorization("access denied to calendar"));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(ProviderError::rate_limited(format!(
                "rate limit exceeded{}",
                retry_after
                    .map(|s| format!(", retry after {} seconds", s))
                    .unwrap_or_default()
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::server(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        let list: EventListResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
        })?;

        let events: Vec<RawEvent> = list.items.into_iter().filter_map(convert_event).collect();

        debug!(
            "fetched {} events from calendar {}",
            events.len(),
            calendar_id
        );
        Ok(events)
    }
}

impl EventSource for CalendarClient {
    fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
        max_results: usize,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        let calendar_id = calendar_id.to_string();
        let window = window.clone();
        Box::pin(async move { self.list_events_in_window(&calendar_id, &window, max_results).await })
    }
}

/// Converts a Calendar API event to a [`RawEvent`].
///
/// Cancelled events and events without usable start/end times are
/// dropped, matching what a listing caller can use.
fn convert_event(event: ApiEvent) -> Option<RawEvent> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let id = event.id?;
    let start = convert_time(&event.start, &id, "start")?;
    let end = convert_time(&event.end, &id, "end")?;

    let attendees = event
        .attendees
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| a.email.map(RawAttendee::new))
        .collect();

    let mut raw = RawEvent::new(id, start, end);
    raw.summary = event.summary;
    raw.description = event.description;
    raw.location = event.location;
    raw.attendees = attendees;
    raw.html_link = event.html_link;

    Some(raw)
}

fn convert_time(time: &ApiEventTime, event_id: &str, which: &str) -> Option<EventTime> {
    match (&time.date_time, &time.date) {
        (Some(dt), _) => {
            let parsed = DateTime::parse_from_rfc3339(dt)
                .map_err(|e| warn!("failed to parse {} time for {}: {}", which, event_id, e))
                .ok()?;
            Some(EventTime::from_utc(parsed.with_timezone(&Utc)))
        }
        (None, Some(date)) => {
            let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| warn!("failed to parse {} date for {}: {}", which, event_id, e))
                .ok()?;
            Some(EventTime::from_date(parsed))
        }
        (None, None) => {
            warn!("event {} has no {} time", event_id, which);
            None
        }
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

/// A single event from the Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    #[serde(default)]
    start: ApiEventTime,
    #[serde(default)]
    end: ApiEventTime,
    html_link: Option<String>,
    status: Option<String>,
    attendees: Option<Vec<ApiAttendee>>,
}

/// Event time from the API: either a datetime or a bare date.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

/// Attendee from the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiAttendee {
    email: Option<String>,
}
