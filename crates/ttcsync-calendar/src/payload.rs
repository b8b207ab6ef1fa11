//! Calendar event payloads.
//!
//! [`EventPayload`] is the create-event body sent to the calendar. Its JSON
//! form follows the Google Calendar v3 event resource:
//!
//! - full-day closures become all-day events whose `end.date` is exclusive
//! - night-only closures become a 23:00 to 06:00 event repeated daily over
//!   every day of the range
//!
//! The `description` always carries the advisory URI, which is how existing
//! events are recognized on later runs.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use ttcsync_core::{ClosureType, Event};

use crate::error::{CalendarError, CalendarResult};

/// Time zone of night-only events unless configured otherwise.
pub const DEFAULT_TIME_ZONE: &str = "America/Toronto";

/// Local time at which a nightly closure starts.
fn night_start() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 0, 0).expect("valid time")
}

/// Local time, on the next day, at which a nightly closure ends.
fn night_end() -> NaiveTime {
    NaiveTime::from_hms_opt(6, 0, 0).expect("valid time")
}

/// Start or end of a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadTime {
    /// All-day date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Local wall-clock time, interpreted in `time_zone`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<NaiveDateTime>,
    /// IANA time zone of `date_time`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl PayloadTime {
    /// An all-day boundary.
    pub fn date(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            date_time: None,
            time_zone: None,
        }
    }

    /// A timed boundary in the given zone.
    pub fn local(date_time: NaiveDateTime, time_zone: impl Into<String>) -> Self {
        Self {
            date: None,
            date_time: Some(date_time),
            time_zone: Some(time_zone.into()),
        }
    }
}

/// The body of a create-event request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    /// Event title.
    pub summary: String,
    /// The advisory URI (identity key).
    pub description: String,
    /// Event start.
    pub start: PayloadTime,
    /// Event end (exclusive).
    pub end: PayloadTime,
    /// RFC 5545 recurrence lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recurrence: Vec<String>,
}

impl EventPayload {
    /// Builds the payload for an event.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidEvent` error for [`ClosureType::Undefined`] events
    /// and for events that end before they start.
    pub fn from_event(event: &Event, time_zone: &str) -> CalendarResult<Self> {
        if !event.is_ordered() {
            return Err(CalendarError::invalid_event(format!(
                "{} ends on {} before it starts on {}",
                event.uri, event.end, event.start
            )));
        }

        let (start, end, recurrence) = match event.closure_type {
            ClosureType::FullDay => (
                PayloadTime::date(event.start),
                PayloadTime::date(event.exclusive_end()),
                Vec::new(),
            ),
            ClosureType::NightOnly => {
                let morning = event
                    .start
                    .checked_add_days(Days::new(1))
                    .ok_or_else(|| CalendarError::invalid_event("date out of range"))?;
                (
                    PayloadTime::local(event.start.and_time(night_start()), time_zone),
                    PayloadTime::local(morning.and_time(night_end()), time_zone),
                    vec![daily_rule(event.day_count())],
                )
            }
            ClosureType::Undefined => {
                return Err(CalendarError::invalid_event(format!(
                    "unable to handle undefined closure type for {}",
                    event.uri
                )));
            }
        };

        Ok(Self {
            summary: event.summary.clone(),
            description: event.uri.clone(),
            start,
            end,
            recurrence,
        })
    }
}

fn daily_rule(count: u64) -> String {
    format!("RRULE:FREQ=DAILY;COUNT={}", count)
}
