//! Core types: dates, time windows, event records, tracing

pub mod dates;
pub mod record;
pub mod time;
pub mod tracing;

pub use dates::{current_time, normalize_date, normalize_date_at, parse_datetime, CurrentTime};
pub use record::{EventRecord, ListEventsResult, ListStatus};
pub use time::{EventTime, TimeWindow};
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
