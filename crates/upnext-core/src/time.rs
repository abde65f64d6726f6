//! Time types for calendar events.
//!
//! This module provides [`EventTime`] for representing event start/end
//! times (which may be either a specific datetime or an all-day date), and
//! [`TimeWindow`] for defining query ranges.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Represents the time of a calendar event.
///
/// Calendar events carry one of two time shapes:
/// - **DateTime**: a specific point in time, stored as UTC
/// - **AllDay**: a date without a clock component (all-day events)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific datetime, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day event date (no specific time).
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates a new `EventTime::DateTime` from a UTC datetime.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates a new `EventTime::AllDay` from a date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Returns `true` if this is an all-day event time.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns `true` if this is a specific datetime.
    pub fn is_datetime(&self) -> bool {
        matches!(self, Self::DateTime(_))
    }

    /// Converts to a UTC datetime for comparison purposes.
    ///
    /// All-day events compare at midnight UTC on their date.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => date.and_hms_opt(0, 0, 0).expect("valid time").and_utc(),
        }
    }

    /// Returns the date portion of this event time.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.date_naive(),
            Self::AllDay(date) => *date,
        }
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc_datetime().cmp(&other.to_utc_datetime())
    }
}

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a window spanning `days` days from the given start instant.
    ///
    /// A day count below 1 is clamped to 1, so missing, zero, or negative
    /// caller input always yields at least a one-day window. A day count
    /// past the representable datetime range clamps the end to the
    /// maximum datetime rather than overflowing.
    pub fn from_days(start: DateTime<Utc>, days: i64) -> Self {
        let days = days.max(1);
        let end = Duration::try_days(days)
            .and_then(|d| start.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(start, end)
    }

    /// Creates a window spanning `days` days from midnight UTC on `date`.
    pub fn from_date(date: NaiveDate, days: i64) -> Self {
        let start = date.and_hms_opt(0, 0, 0).expect("valid time").and_utc();
        Self::from_days(start, days)
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if a datetime falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Checks if an event time falls within this window.
    pub fn contains_event_time(&self, et: &EventTime) -> bool {
        self.contains(et.to_utc_datetime())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod event_time {
        use super::*;

        #[test]
        fn datetime_creation() {
            let dt = utc(2024, 6, 15, 10, 30, 0);
            let et = EventTime::from_utc(dt);
            assert!(et.is_datetime());
            assert!(!et.is_all_day());
            assert_eq!(et.to_utc_datetime(), dt);
        }

        #[test]
        fn allday_creation() {
            let d = date(2024, 6, 15);
            let et = EventTime::from_date(d);
            assert!(et.is_all_day());
            assert_eq!(et.date(), d);
            assert_eq!(et.to_utc_datetime(), utc(2024, 6, 15, 0, 0, 0));
        }

        #[test]
        fn ordering() {
            let midnight = EventTime::from_date(date(2024, 6, 15));
            let morning = EventTime::from_utc(utc(2024, 6, 15, 10, 0, 0));
            let noon = EventTime::from_utc(utc(2024, 6, 15, 12, 0, 0));

            assert!(midnight < morning);
            assert!(morning < noon);
        }

        #[test]
        fn serde_roundtrip() {
            let et = EventTime::from_utc(utc(2024, 6, 15, 10, 30, 0));
            let json = serde_json::to_string(&et).unwrap();
            let parsed: EventTime = serde_json::from_str(&json).unwrap();
            assert_eq!(et, parsed);
        }
    }

    mod time_window {
        use super::*;

        #[test]
        fn from_days() {
            let start = utc(2024, 6, 15, 0, 0, 0);
            let window = TimeWindow::from_days(start, 7);
            assert_eq!(window.start, start);
            assert_eq!(window.end, utc(2024, 6, 22, 0, 0, 0));
            assert_eq!(window.duration(), Duration::days(7));
        }

        #[test]
        fn from_days_clamps_to_one() {
            let start = utc(2024, 6, 15, 0, 0, 0);
            for days in [0, -5, i64::MIN + 1] {
                let window = TimeWindow::from_days(start, days);
                assert_eq!(window.duration(), Duration::days(1));
            }
        }

        #[test]
        fn from_days_clamps_overflowing_day_counts() {
            let start = utc(2024, 6, 15, 0, 0, 0);
            // Both a duration overflow and a datetime overflow clamp.
            for days in [i64::MAX, 1_000_000_000] {
                let window = TimeWindow::from_days(start, days);
                assert_eq!(window.start, start);
                assert_eq!(window.end, DateTime::<Utc>::MAX_UTC);
            }
        }

        #[test]
        fn from_date_starts_at_midnight() {
            let window = TimeWindow::from_date(date(2024, 6, 15), 1);
            assert_eq!(window.start, utc(2024, 6, 15, 0, 0, 0));
            assert_eq!(window.end, utc(2024, 6, 16, 0, 0, 0));
        }

        #[test]
        fn contains_is_half_open() {
            let window = TimeWindow::new(utc(2024, 6, 15, 9, 0, 0), utc(2024, 6, 15, 17, 0, 0));

            assert!(window.contains(utc(2024, 6, 15, 9, 0, 0))); // start inclusive
            assert!(window.contains(utc(2024, 6, 15, 16, 59, 59)));
            assert!(!window.contains(utc(2024, 6, 15, 17, 0, 0))); // end exclusive
            assert!(!window.contains(utc(2024, 6, 15, 8, 59, 59)));
        }

        #[test]
        fn contains_event_time() {
            let window = TimeWindow::from_date(date(2024, 6, 15), 1);
            assert!(window.contains_event_time(&EventTime::from_date(date(2024, 6, 15))));
            assert!(!window.contains_event_time(&EventTime::from_date(date(2024, 6, 16))));
        }

        #[test]
        #[should_panic(expected = "start must be <= end")]
        fn invalid_window() {
            TimeWindow::new(utc(2024, 6, 15, 17, 0, 0), utc(2024, 6, 15, 9, 0, 0));
        }
    }
}
