//! Date-expression normalization.
//!
//! This module converts free-form date input into canonical `YYYY-MM-DD`
//! strings. Input is either a relative keyword (`today`, `tomorrow`,
//! `yesterday`, phrases containing `next week`, `next month`, `this week`,
//! `this month`), an already-canonical date, or one of several common
//! absolute formats.
//!
//! Normalization is deliberately forgiving: input that matches nothing
//! resolves to today's date rather than an error. Callers that need a hard
//! failure on unparseable input should use [`parse_datetime`] directly.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// The canonical date format produced by [`normalize_date`].
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepted absolute formats, tried in order.
///
/// The second tuple element marks formats that carry a clock component;
/// date-only formats are parsed as dates and resolved to midnight.
const FALLBACK_FORMATS: &[(&str, bool)] = &[
    ("%Y-%m-%d %H:%M", true),
    ("%Y-%m-%d %I:%M %p", true),
    ("%Y-%m-%d", false),
    ("%m/%d/%Y %H:%M", true),
    ("%m/%d/%Y %I:%M %p", true),
    ("%m/%d/%Y", false),
    ("%B %d, %Y %H:%M", true),
    ("%B %d, %Y %I:%M %p", true),
    ("%B %d, %Y", false),
];

/// Parses a datetime string against the ordered fallback format list.
///
/// The first format that parses wins. Date-only formats resolve to
/// midnight. Returns `None` when every format fails; this never panics
/// or errors.
pub fn parse_datetime(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();

    for (format, has_clock) in FALLBACK_FORMATS {
        if *has_clock {
            if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
                return Some(dt);
            }
        } else if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return Some(date.and_hms_opt(0, 0, 0).expect("midnight is valid"));
        }
    }

    None
}

/// Normalizes a date expression to canonical `YYYY-MM-DD` form.
///
/// Resolution order:
///
/// 1. Empty or whitespace-only input returns `""` (callers treat this as
///    "use today").
/// 2. Relative keywords, matched case-insensitively on the trimmed input:
///    exact `today`/`tomorrow`/`yesterday`, then substring containment of
///    `next week`, `next month`, `this week`, `this month`. Offsets are
///    flat day counts (`next week` is +7 days, `next month` is +30 days;
///    calendar-month arithmetic is deliberately not used). `this week`
///    and `this month` both resolve to today's date - a known
///    simplification, kept intentionally.
/// 3. Already-canonical `YYYY-MM-DD` input is returned unchanged.
/// 4. The ordered fallback formats of [`parse_datetime`]; the date
///    portion of the first match is reformatted canonically.
/// 5. Anything else falls back to today's date. This silent fallback is
///    intentional: normalization never fails.
pub fn normalize_date(expr: &str) -> String {
    normalize_date_at(expr, Local::now().date_naive())
}

/// [`normalize_date`] with an explicit "today", for deterministic callers
/// and tests.
pub fn normalize_date_at(expr: &str, today: NaiveDate) -> String {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let lowered = trimmed.to_lowercase();
    let relative = match lowered.as_str() {
        "today" => Some(today),
        "tomorrow" => Some(today + Duration::days(1)),
        "yesterday" => Some(today - Duration::days(1)),
        _ => {
            if lowered.contains("next week") {
                Some(today + Duration::days(7))
            } else if lowered.contains("next month") {
                Some(today + Duration::days(30))
            } else if lowered.contains("this week") || lowered.contains("this month") {
                Some(today)
            } else {
                None
            }
        }
    };

    if let Some(date) = relative {
        return date.format(CANONICAL_DATE_FORMAT).to_string();
    }

    // Already canonical: return the input as given.
    if NaiveDate::parse_from_str(trimmed, CANONICAL_DATE_FORMAT).is_ok() {
        return trimmed.to_string();
    }

    match parse_datetime(trimmed) {
        Some(dt) => dt.date().format(CANONICAL_DATE_FORMAT).to_string(),
        None => today.format(CANONICAL_DATE_FORMAT).to_string(),
    }
}

/// The current instant in the two formats callers expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentTime {
    /// Current date and time as `YYYY-MM-DD HH:MM:SS`.
    pub current_time: String,
    /// Current date as `MM-DD-YYYY`.
    pub formatted_date: String,
}

/// Returns the current local date and time.
pub fn current_time() -> CurrentTime {
    let now = Local::now();
    CurrentTime {
        current_time: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        formatted_date: now.format("%m-%d-%Y").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod relative_keywords {
        use super::*;

        #[test]
        fn today_tomorrow_yesterday() {
            let today = date(2024, 6, 15);
            assert_eq!(normalize_date_at("today", today), "2024-06-15");
            assert_eq!(normalize_date_at("tomorrow", today), "2024-06-16");
            assert_eq!(normalize_date_at("yesterday", today), "2024-06-14");
        }

        #[test]
        fn case_insensitive_and_trimmed() {
            let today = date(2024, 6, 15);
            assert_eq!(normalize_date_at("  Today  ", today), "2024-06-15");
            assert_eq!(normalize_date_at("TOMORROW", today), "2024-06-16");
        }

        #[test]
        fn next_week_is_flat_seven_days() {
            let today = date(2024, 6, 15);
            assert_eq!(normalize_date_at("next week", today), "2024-06-22");
            assert_eq!(normalize_date_at("sometime next week", today), "2024-06-22");
        }

        #[test]
        fn next_month_is_flat_thirty_days() {
            // Flat 30-day offset, independent of month boundaries:
            // Jan 31 + 30 days lands on Mar 1 in a leap year, not Feb 29.
            assert_eq!(
                normalize_date_at("next month", date(2024, 1, 31)),
                "2024-03-01"
            );
            assert_eq!(
                normalize_date_at("next month", date(2024, 6, 15)),
                "2024-07-15"
            );
        }

        #[test]
        fn this_week_and_this_month_collapse_to_today() {
            let today = date(2024, 6, 15);
            assert_eq!(normalize_date_at("this week", today), "2024-06-15");
            assert_eq!(normalize_date_at("this month", today), "2024-06-15");
            assert_eq!(normalize_date_at("early this month", today), "2024-06-15");
        }

        #[test]
        fn keyword_crosses_month_boundary() {
            assert_eq!(
                normalize_date_at("tomorrow", date(2024, 6, 30)),
                "2024-07-01"
            );
            assert_eq!(
                normalize_date_at("yesterday", date(2024, 7, 1)),
                "2024-06-30"
            );
        }
    }

    mod absolute_input {
        use super::*;

        #[test]
        fn canonical_passthrough() {
            let today = date(2024, 1, 1);
            assert_eq!(normalize_date_at("2024-06-15", today), "2024-06-15");
        }

        #[test]
        fn us_slash_format() {
            let today = date(2024, 1, 1);
            assert_eq!(normalize_date_at("06/15/2024", today), "2024-06-15");
        }

        #[test]
        fn month_name_format() {
            let today = date(2024, 1, 1);
            assert_eq!(normalize_date_at("June 15, 2024", today), "2024-06-15");
        }

        #[test]
        fn clock_component_is_discarded() {
            let today = date(2024, 1, 1);
            assert_eq!(normalize_date_at("2024-06-15 14:30", today), "2024-06-15");
            assert_eq!(
                normalize_date_at("06/15/2024 02:30 PM", today),
                "2024-06-15"
            );
        }

        #[test]
        fn normalization_is_idempotent() {
            let today = date(2024, 1, 1);
            for input in ["06/15/2024", "June 15, 2024 02:30 PM", "2024-06-15 14:30"] {
                let once = normalize_date_at(input, today);
                let twice = normalize_date_at(&once, today);
                assert_eq!(once, twice, "second pass changed {input:?}");
                assert!(NaiveDate::parse_from_str(&once, CANONICAL_DATE_FORMAT).is_ok());
            }
        }
    }

    mod fallbacks {
        use super::*;

        #[test]
        fn empty_input_stays_empty() {
            let today = date(2024, 6, 15);
            assert_eq!(normalize_date_at("", today), "");
            assert_eq!(normalize_date_at("   ", today), "");
        }

        #[test]
        fn garbage_falls_back_to_today() {
            let today = date(2024, 6, 15);
            assert_eq!(normalize_date_at("garbage-text", today), "2024-06-15");
            assert_eq!(normalize_date_at("15th of June", today), "2024-06-15");
        }
    }

    mod parse_datetime_standalone {
        use super::*;

        #[test]
        fn parses_24_hour_clock() {
            let dt = parse_datetime("2024-06-15 14:30").unwrap();
            assert_eq!(dt.date(), date(2024, 6, 15));
            assert_eq!(dt.format("%H:%M").to_string(), "14:30");
        }

        #[test]
        fn parses_12_hour_clock() {
            let dt = parse_datetime("06/15/2024 02:30 PM").unwrap();
            assert_eq!(dt.format("%H:%M").to_string(), "14:30");
        }

        #[test]
        fn date_only_resolves_to_midnight() {
            let dt = parse_datetime("June 15, 2024").unwrap();
            assert_eq!(dt.format("%H:%M:%S").to_string(), "00:00:00");
        }

        #[test]
        fn unparseable_returns_none() {
            assert!(parse_datetime("not-a-date").is_none());
            assert!(parse_datetime("").is_none());
            assert!(parse_datetime("2024/06/15").is_none());
        }
    }

    #[test]
    fn current_time_shapes() {
        let now = current_time();
        assert!(NaiveDateTime::parse_from_str(&now.current_time, "%Y-%m-%d %H:%M:%S").is_ok());
        assert!(NaiveDate::parse_from_str(&now.formatted_date, "%m-%d-%Y").is_ok());
    }
}
