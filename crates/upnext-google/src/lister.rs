//! Windowed event listing against the primary calendar.
//!
//! [`EventLister`] is the main entry point: it resolves the caller's
//! start date and day count into a [`TimeWindow`], acquires an
//! authenticated session, runs a single list query, and folds outcome
//! and failures alike into a uniform [`ListEventsResult`]. Nothing here
//! raises; every failure becomes an error-status result.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use upnext_core::{ListEventsResult, TimeWindow};

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::raw_event::RawEvent;
use crate::reshape::record_from_raw;
use crate::session::SessionProvider;
use crate::source::{BoxFuture, EventSource};

/// The calendar queried by the lister.
pub const PRIMARY_CALENDAR: &str = "primary";

/// Result cap for a single list query. No pagination past this.
pub const MAX_RESULTS: usize = 100;

const NO_EVENTS_MESSAGE: &str = "No upcoming events found.";

/// Resolves a start date and day count into a query window.
///
/// An empty or blank `start_date` starts the window at `now`; otherwise
/// the input must already be canonical `YYYY-MM-DD` and the window starts
/// at midnight UTC on that date. Day counts below 1 are clamped to 1.
///
/// # Errors
///
/// Fails with an invalid-date error when `start_date` is non-empty and
/// not canonical. Run the input through
/// [`normalize_date`](upnext_core::normalize_date) first to accept
/// relative keywords and looser formats.
pub fn resolve_window(
    start_date: &str,
    days: i64,
    now: DateTime<Utc>,
) -> ProviderResult<TimeWindow> {
    let trimmed = start_date.trim();
    if trimmed.is_empty() {
        return Ok(TimeWindow::from_days(now, days));
    }

    match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        Ok(date) => Ok(TimeWindow::from_date(date, days)),
        Err(_) => Err(ProviderError::invalid_date(format!(
            "invalid date format: {}, expected YYYY-MM-DD",
            trimmed
        ))),
    }
}

/// Lists events from a source and folds the outcome into a result.
///
/// Zero events is a success with the no-events message; any source error
/// becomes an error-status result carrying its description, with
/// credential-category failures named as authentication failures.
pub async fn list_in_window(source: &dyn EventSource, window: &TimeWindow) -> ListEventsResult {
    match source
        .list_events(PRIMARY_CALENDAR, window, MAX_RESULTS)
        .await
    {
        Ok(events) if events.is_empty() => {
            debug!("no events in window");
            ListEventsResult::success(NO_EVENTS_MESSAGE, Vec::new())
        }
        Ok(events) => {
            debug!(count = events.len(), "listed events");
            let records = events.iter().map(record_from_raw).collect::<Vec<_>>();
            ListEventsResult::success(format!("Found {} event(s).", records.len()), records)
        }
        Err(e) => {
            warn!("event query failed: {}", e);
            match e.code() {
                ProviderErrorCode::MissingClientConfig
                | ProviderErrorCode::AuthenticationFailed
                | ProviderErrorCode::AuthorizationFailed => {
                    ListEventsResult::error(format!("authentication failed: {}", e))
                }
                _ => ListEventsResult::error(format!("error fetching events: {}", e)),
            }
        }
    }
}

/// Resolves the window and queries the source.
///
/// Resolution runs first, so an unparseable start date returns an error
/// result without the source ever being called.
pub async fn list_events_from(
    source: &dyn EventSource,
    start_date: &str,
    days: i64,
    now: DateTime<Utc>,
) -> ListEventsResult {
    let window = match resolve_window(start_date, days, now) {
        Ok(window) => window,
        Err(e) => return ListEventsResult::error(e.message().to_string()),
    };
    list_in_window(source, &window).await
}

/// Lists calendar events in a time window through an authenticated session.
pub struct EventLister {
    session: SessionProvider,
}

impl EventLister {
    /// Creates a lister over the given session provider.
    pub fn new(session: SessionProvider) -> Self {
        Self { session }
    }

    /// Lists events starting at `start_date` over `days` days.
    ///
    /// `start_date` is either blank (start now) or canonical
    /// `YYYY-MM-DD`; pass free-form input through
    /// [`normalize_date`](upnext_core::normalize_date) first. The
    /// returned result is uniform: failures of any kind, from an
    /// unparseable date to a failed session acquisition or a rejected
    /// query, come back as an error-status result rather than an `Err`.
    /// A bad date short-circuits before session acquisition, so no
    /// browser or network activity is triggered for it.
    pub async fn list_events(&self, start_date: &str, days: i64) -> ListEventsResult {
        let source = SessionSource {
            session: &self.session,
        };
        list_events_from(&source, start_date, days, Utc::now()).await
    }

    /// Returns the underlying session provider.
    pub fn session(&self) -> &SessionProvider {
        &self.session
    }
}

/// Acquires a session per query and forwards to the bound client.
struct SessionSource<'a> {
    session: &'a SessionProvider,
}

impl EventSource for SessionSource<'_> {
    fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
        max_results: usize,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
        let calendar_id = calendar_id.to_string();
        let window = window.clone();
        Box::pin(async move {
            let client = self.session.acquire_session().await?;
            client
                .list_events_in_window(&calendar_id, &window, max_results)
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{Duration, TimeZone};

    use upnext_core::{EventTime, ListStatus};

    use crate::error::ProviderErrorCode;
    use crate::raw_event::RawEvent;
    use crate::source::BoxFuture;

    struct StubSource {
        response: ProviderResult<Vec<RawEvent>>,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn returning(events: Vec<RawEvent>) -> Self {
            Self {
                response: Ok(events),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(error: ProviderError) -> Self {
            Self {
                response: Err(error),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EventSource for StubSource {
        fn list_events(
            &self,
            _calendar_id: &str,
            _window: &TimeWindow,
            _max_results: usize,
        ) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = match &self.response {
                Ok(events) => Ok(events.clone()),
                Err(e) => Err(ProviderError::new(e.code(), e.message())),
            };
            Box::pin(async move { response })
        }
    }

    fn sample_event(id: &str) -> RawEvent {
        let start = EventTime::from_utc(Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap());
        let end = EventTime::from_utc(Utc.with_ymd_and_hms(2024, 6, 15, 11, 0, 0).unwrap());
        RawEvent::new(id, start, end).with_summary("Meeting")
    }

    mod resolve_window {
        use super::*;

        #[test]
        fn blank_input_starts_now() {
            let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap();
            for input in ["", "   "] {
                let window = resolve_window(input, 7, now).unwrap();
                assert_eq!(window.start, now);
                assert_eq!(window.duration(), Duration::days(7));
            }
        }

        #[test]
        fn canonical_date_starts_at_midnight() {
            let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap();
            let window = resolve_window("2024-07-01", 3, now).unwrap();
            assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap());
            assert_eq!(window.duration(), Duration::days(3));
        }

        #[test]
        fn day_count_is_clamped() {
            let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap();
            for days in [0, -7] {
                let window = resolve_window("", days, now).unwrap();
                assert_eq!(window.duration(), Duration::days(1));
            }
        }

        #[test]
        fn non_canonical_input_is_rejected() {
            let now = Utc::now();
            for input in ["not-a-date", "06/15/2024", "tomorrow"] {
                let err = resolve_window(input, 7, now).unwrap_err();
                assert_eq!(err.code(), ProviderErrorCode::InvalidDate);
                assert!(err.message().contains("invalid date format"));
            }
        }
    }

    mod list_in_window {
        use super::*;

        fn window() -> TimeWindow {
            TimeWindow::from_days(Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap(), 7)
        }

        #[tokio::test]
        async fn zero_events_is_success_with_literal_message() {
            let source = StubSource::returning(Vec::new());
            let result = list_in_window(&source, &window()).await;
            assert_eq!(result.status, ListStatus::Success);
            assert_eq!(result.message, "No upcoming events found.");
            assert!(result.events.is_empty());
        }

        #[tokio::test]
        async fn events_are_counted_and_reshaped() {
            let source = StubSource::returning(vec![sample_event("a"), sample_event("b")]);
            let result = list_in_window(&source, &window()).await;
            assert_eq!(result.status, ListStatus::Success);
            assert_eq!(result.message, "Found 2 event(s).");
            assert_eq!(result.events.len(), 2);
            assert_eq!(result.events[0].summary, "Meeting");
        }

        #[tokio::test]
        async fn source_failure_becomes_error_result() {
            let source = StubSource::failing(ProviderError::network("connection refused"));
            let result = list_in_window(&source, &window()).await;
            assert_eq!(result.status, ListStatus::Error);
            assert!(result.message.contains("error fetching events"));
            assert!(result.events.is_empty());
        }

        #[tokio::test]
        async fn credential_failure_names_authentication() {
            let source = StubSource::failing(ProviderError::authentication("token revoked"));
            let result = list_in_window(&source, &window()).await;
            assert_eq!(result.status, ListStatus::Error);
            assert!(result.message.contains("authentication failed"));
        }
    }

    mod list_events_from {
        use super::*;

        #[tokio::test]
        async fn invalid_date_never_reaches_the_source() {
            let source = StubSource::returning(vec![sample_event("a")]);

            let result = list_events_from(&source, "not-a-date", 7, Utc::now()).await;
            assert_eq!(result.status, ListStatus::Error);
            assert!(result.message.contains("invalid date format"));
            assert_eq!(source.call_count(), 0);
        }

        #[tokio::test]
        async fn valid_date_queries_the_source_once() {
            let source = StubSource::returning(vec![sample_event("a")]);

            let result = list_events_from(&source, "2024-06-15", 7, Utc::now()).await;
            assert_eq!(result.status, ListStatus::Success);
            assert_eq!(source.call_count(), 1);
        }

        #[tokio::test]
        async fn huge_day_count_is_clamped_not_a_panic() {
            let source = StubSource::returning(Vec::new());

            let result = list_events_from(&source, "2024-06-15", i64::MAX, Utc::now()).await;
            assert_eq!(result.status, ListStatus::Success);
            assert_eq!(result.message, "No upcoming events found.");
        }
    }
}
