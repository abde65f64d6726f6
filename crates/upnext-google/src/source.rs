//! The event-source seam.
//!
//! [`EventSource`] exposes the single capability the lister needs from a
//! calendar backend: list raw events in a time window. The lister talks
//! only to this trait, so tests substitute a stub implementation instead
//! of a live API client.

use std::future::Future;
use std::pin::Pin;

use upnext_core::TimeWindow;

use crate::error::ProviderResult;
use crate::raw_event::RawEvent;

/// A boxed future for object-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A backend capable of listing calendar events in a window.
///
/// Implementations return events whose start falls inside `window`,
/// with recurring events expanded into individual instances, ordered by
/// start time ascending, and no more than `max_results` of them.
pub trait EventSource: Send + Sync {
    /// Lists raw events from the given calendar inside the window.
    fn list_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
        max_results: usize,
    ) -> BoxFuture<'_, ProviderResult<Vec<RawEvent>>>;
}
