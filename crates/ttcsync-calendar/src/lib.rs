//! Destination calendar and synchronization.
//!
//! This crate writes extracted advisory events into a calendar without
//! creating duplicates across runs:
//!
//! - [`CalendarClient`] - the calendar seam (list, insert)
//! - [`GoogleCalendarClient`] - Google Calendar API v3 over HTTP
//! - [`MemoryCalendar`] - in-process calendar for tests and rehearsals
//! - [`EventPayload`] - the create-event body built from an event
//! - [`CalendarSync`] - window, dedup and insert loop
//!
//! # Architecture
//!
//! ```text
//!   [Event] --> SyncWindow --> list_events --> known URIs
//!      |                                          |
//!      +--------------> filter <------------------+
//!                          |
//!                          v EventPayload::from_event()
//!                    insert_event --> SyncReport
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ttcsync_calendar::{CalendarSync, MemoryCalendar, SyncConfig};
//!
//! let sync = CalendarSync::new(MemoryCalendar::new(), SyncConfig::new("primary"));
//! let report = sync.sync(&events).await?;
//! ```

pub mod client;
pub mod error;
pub mod google;
pub mod memory;
pub mod payload;
pub mod sync;
pub mod token;

pub use client::{BoxFuture, CalendarClient, CreatedEvent, ExistingEvent};
pub use error::{CalendarError, CalendarErrorCode, CalendarResult};
pub use google::{CALENDAR_API_BASE, GoogleCalendarClient};
pub use memory::{MemoryCalendar, StoredEvent};
pub use payload::{DEFAULT_TIME_ZONE, EventPayload, PayloadTime};
pub use sync::{CalendarSync, FailedEvent, SyncConfig, SyncReport, SyncWindow};
pub use token::AccessToken;
