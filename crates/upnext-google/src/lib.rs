//! Google Calendar session management and event listing.
//!
//! This crate authenticates against Google Calendar and lists events in
//! a time window:
//!
//! - [`SessionProvider`] - OAuth token lifecycle (cache, refresh, consent)
//! - [`CalendarClient`] - the Calendar v3 API client
//! - [`EventLister`] - the windowed listing entry point
//! - [`EventSource`] - the one-capability seam the lister queries through
//! - [`ProviderError`] - error types for provider operations
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────┐   acquire_session   ┌────────────────┐
//! │ EventLister   ├────────────────────▶│ SessionProvider│
//! └──────┬────────┘                     └───────┬────────┘
//!        │                              token cache / refresh /
//!        │ EventSource                  browser consent
//!        ▼                                      │
//! ┌───────────────┐                             ▼
//! │ CalendarClient│◀────────── access token ────┘
//! └──────┬────────┘
//!        │ one list query (singleEvents, orderBy=startTime)
//!        ▼
//! ┌───────────────┐  record_from_raw  ┌──────────────────┐
//! │   RawEvent    ├──────────────────▶│   EventRecord    │
//! └───────────────┘                   └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use upnext_core::normalize_date;
//! use upnext_google::{EventLister, SessionConfig, SessionProvider};
//!
//! let session = SessionProvider::new(SessionConfig::new())?;
//! let lister = EventLister::new(session);
//! let result = lister.list_events(&normalize_date("tomorrow"), 7).await;
//! println!("{}", result.message);
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod lister;
pub mod oauth;
pub mod raw_event;
pub mod reshape;
pub mod session;
pub mod source;
pub mod tokens;

// Re-export main types at crate root
pub use client::CalendarClient;
pub use config::{OAuthCredentials, SessionConfig};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use lister::{
    list_events_from, list_in_window, resolve_window, EventLister, MAX_RESULTS, PRIMARY_CALENDAR,
};
pub use raw_event::{RawAttendee, RawEvent};
pub use reshape::{format_event_time, record_from_raw};
pub use session::SessionProvider;
pub use source::{BoxFuture, EventSource};
pub use tokens::{TokenInfo, TokenStorage};
