//! CalendarClient trait definition.
//!
//! This module defines the [`CalendarClient`] trait, the seam between the
//! sync orchestrator and a concrete calendar backend.
//!
//! Clients are responsible for:
//! - Listing the events already present in a date window
//! - Inserting new events
//! - Handling authentication and pagination internally

use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CalendarResult;
use crate::payload::EventPayload;

/// An event already present in the calendar.
///
/// Only the fields needed to recognize previously synced advisories are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingEvent {
    /// Calendar-side identifier.
    pub id: String,
    /// Event title.
    pub summary: Option<String>,
    /// Event description. Synced events carry their advisory URI here.
    pub description: Option<String>,
}

impl ExistingEvent {
    /// Creates an existing event with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: None,
            description: None,
        }
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// The calendar's answer to a successful insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedEvent {
    /// Calendar-side identifier of the new event.
    pub id: String,
    /// Title as stored.
    pub summary: Option<String>,
    /// Link to the event in the calendar UI, if provided.
    pub html_link: Option<String>,
}

/// A boxed future for async trait methods.
///
/// Boxed futures keep [`CalendarClient`] object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The core abstraction for destination calendars.
///
/// # Implementation Notes
///
/// - Implementations should be `Send + Sync` for use in async contexts
/// - `list_events` must return every page of results
/// - Neither method retries; the orchestrator decides what to retry
pub trait CalendarClient: Send + Sync {
    /// Returns the name/type of this client (e.g., "google", "memory").
    fn name(&self) -> &str;

    /// Lists events overlapping `[time_min, time_max)`.
    ///
    /// # Errors
    ///
    /// Returns `CalendarError` on network errors, authentication failures,
    /// unknown calendars, etc.
    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        time_min: NaiveDate,
        time_max: NaiveDate,
    ) -> BoxFuture<'a, CalendarResult<Vec<ExistingEvent>>>;

    /// Inserts one event.
    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        payload: &'a EventPayload,
    ) -> BoxFuture<'a, CalendarResult<CreatedEvent>>;
}
