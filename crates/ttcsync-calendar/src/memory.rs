//! In-process calendar.
//!
//! [`MemoryCalendar`] keeps inserted payloads in memory. It backs the
//! offline rehearsal mode of the CLI and the sync tests, and can be told to
//! fail listings or specific inserts.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{Days, NaiveDate};

use crate::client::{BoxFuture, CalendarClient, CreatedEvent, ExistingEvent};
use crate::error::{CalendarError, CalendarResult};
use crate::payload::EventPayload;

const CLIENT_NAME: &str = "memory";

/// An event held by a [`MemoryCalendar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    /// Calendar the event was inserted into.
    pub calendar_id: String,
    /// Generated identifier.
    pub id: String,
    /// The inserted payload.
    pub payload: EventPayload,
}

impl StoredEvent {
    /// First day touched by the event.
    fn first_day(&self) -> Option<NaiveDate> {
        let start = &self.payload.start;
        start.date.or(start.date_time.map(|dt| dt.date()))
    }

    /// Returns true if the event, including every recurrence, overlaps
    /// `[time_min, time_max)`.
    fn overlaps(&self, time_min: NaiveDate, time_max: NaiveDate) -> bool {
        let Some(first_day) = self.first_day() else {
            return false;
        };
        if first_day >= time_max {
            return false;
        }

        let end = &self.payload.end;
        let extra_days = Days::new(recurrence_count(&self.payload).saturating_sub(1));
        match (end.date, end.date_time) {
            (Some(date), _) => date
                .checked_add_days(extra_days)
                .is_some_and(|last| last > time_min),
            (None, Some(dt)) => dt
                .date()
                .checked_add_days(extra_days)
                .is_some_and(|last| last >= time_min),
            (None, None) => false,
        }
    }
}

/// Occurrence count of a daily recurrence, 1 for single events.
fn recurrence_count(payload: &EventPayload) -> u64 {
    payload
        .recurrence
        .iter()
        .filter_map(|rule| rule.split(';').find_map(|part| part.strip_prefix("COUNT=")))
        .find_map(|count| count.parse().ok())
        .unwrap_or(1)
}

#[derive(Debug, Default)]
struct State {
    events: Vec<StoredEvent>,
    seeded: Vec<(String, ExistingEvent)>,
    failing_lists: u32,
    failing_inserts: HashSet<String>,
    list_calls: u32,
    insert_calls: u32,
    next_id: u64,
}

/// A calendar living in process memory.
#[derive(Debug, Default)]
pub struct MemoryCalendar {
    state: Mutex<State>,
}

impl MemoryCalendar {
    /// Creates an empty calendar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an event that listing always returns, whatever the window.
    pub fn seed(&self, calendar_id: impl Into<String>, event: ExistingEvent) {
        self.lock().seeded.push((calendar_id.into(), event));
    }

    /// Makes the next `count` listings fail with a network error.
    pub fn fail_next_lists(&self, count: u32) {
        self.lock().failing_lists = count;
    }

    /// Makes every insert whose description equals `uri` fail.
    pub fn fail_inserts_for(&self, uri: impl Into<String>) {
        self.lock().failing_inserts.insert(uri.into());
    }

    /// Returns every inserted event, in insertion order.
    pub fn events(&self) -> Vec<StoredEvent> {
        self.lock().events.clone()
    }

    /// Returns how many times `list_events` was called.
    pub fn list_calls(&self) -> u32 {
        self.lock().list_calls
    }

    /// Returns how many times `insert_event` was called.
    pub fn insert_calls(&self) -> u32 {
        self.lock().insert_calls
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn list(
        &self,
        calendar_id: &str,
        time_min: NaiveDate,
        time_max: NaiveDate,
    ) -> CalendarResult<Vec<ExistingEvent>> {
        let mut state = self.lock();
        state.list_calls += 1;

        if state.failing_lists > 0 {
            state.failing_lists -= 1;
            return Err(
                CalendarError::transient("simulated listing failure").with_client(CLIENT_NAME)
            );
        }

        let seeded = state
            .seeded
            .iter()
            .filter(|(id, _)| id == calendar_id)
            .map(|(_, event)| event.clone());

        let stored = state
            .events
            .iter()
            .filter(|e| e.calendar_id == calendar_id && e.overlaps(time_min, time_max))
            .map(|e| ExistingEvent {
                id: e.id.clone(),
                summary: Some(e.payload.summary.clone()),
                description: Some(e.payload.description.clone()),
            });

        Ok(seeded.chain(stored).collect())
    }

    fn insert(&self, calendar_id: &str, payload: &EventPayload) -> CalendarResult<CreatedEvent> {
        let mut state = self.lock();
        state.insert_calls += 1;

        if state.failing_inserts.contains(&payload.description) {
            return Err(CalendarError::transient(format!(
                "simulated insert failure for {}",
                payload.description
            ))
            .with_client(CLIENT_NAME));
        }

        state.next_id += 1;
        let id = format!("mem-{}", state.next_id);
        state.events.push(StoredEvent {
            calendar_id: calendar_id.to_string(),
            id: id.clone(),
            payload: payload.clone(),
        });

        Ok(CreatedEvent {
            id,
            summary: Some(payload.summary.clone()),
            html_link: None,
        })
    }
}

impl CalendarClient for MemoryCalendar {
    fn name(&self) -> &str {
        CLIENT_NAME
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        time_min: NaiveDate,
        time_max: NaiveDate,
    ) -> BoxFuture<'a, CalendarResult<Vec<ExistingEvent>>> {
        let result = self.list(calendar_id, time_min, time_max);
        Box::pin(async move { result })
    }

    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        payload: &'a EventPayload,
    ) -> BoxFuture<'a, CalendarResult<CreatedEvent>> {
        let result = self.insert(calendar_id, payload);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use ttcsync_core::{ClosureType, Event};

    use super::*;
    use crate::error::CalendarErrorCode;
    use crate::payload::DEFAULT_TIME_ZONE;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payload(closure_type: ClosureType, start: NaiveDate, end: NaiveDate) -> EventPayload {
        let event = Event::new("Line 1 - closure", "https://ttc.ca/a", closure_type, start, end);
        EventPayload::from_event(&event, DEFAULT_TIME_ZONE).unwrap()
    }

    #[tokio::test]
    async fn insert_then_list() {
        let calendar = MemoryCalendar::new();
        let payload = payload(ClosureType::FullDay, date(2022, 3, 12), date(2022, 3, 13));

        let created = calendar.insert_event("cal", &payload).await.unwrap();
        assert_eq!(created.id, "mem-1");

        let listed = calendar
            .list_events("cal", date(2022, 3, 1), date(2022, 4, 1))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].description.as_deref(), Some("https://ttc.ca/a"));

        let other = calendar
            .list_events("other", date(2022, 3, 1), date(2022, 4, 1))
            .await
            .unwrap();
        assert!(other.is_empty());
        assert_eq!(calendar.list_calls(), 2);
        assert_eq!(calendar.insert_calls(), 1);
    }

    #[test]
    fn all_day_window_is_half_open() {
        let calendar = MemoryCalendar::new();
        let payload = payload(ClosureType::FullDay, date(2022, 3, 12), date(2022, 3, 13));
        calendar.insert("cal", &payload).unwrap();

        // Occupies March 12 and 13; end.date is March 14.
        assert_eq!(calendar.list("cal", date(2022, 3, 13), date(2022, 3, 20)).unwrap().len(), 1);
        assert!(calendar.list("cal", date(2022, 3, 14), date(2022, 3, 20)).unwrap().is_empty());
        assert!(calendar.list("cal", date(2022, 3, 1), date(2022, 3, 12)).unwrap().is_empty());
    }

    #[test]
    fn recurring_window_covers_every_night() {
        let calendar = MemoryCalendar::new();
        let payload = payload(ClosureType::NightOnly, date(2022, 3, 7), date(2022, 3, 10));
        assert_eq!(recurrence_count(&payload), 4);
        calendar.insert("cal", &payload).unwrap();

        // Last night ends on the morning of March 11.
        assert_eq!(calendar.list("cal", date(2022, 3, 11), date(2022, 3, 12)).unwrap().len(), 1);
        assert!(calendar.list("cal", date(2022, 3, 12), date(2022, 3, 20)).unwrap().is_empty());
    }

    #[test]
    fn seeded_events_are_always_listed() {
        let calendar = MemoryCalendar::new();
        calendar.seed("cal", ExistingEvent::new("old").with_description("https://ttc.ca/old"));

        let listed = calendar.list("cal", date(2030, 1, 1), date(2030, 1, 2)).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "old");
    }

    #[test]
    fn injected_failures() {
        let calendar = MemoryCalendar::new();
        calendar.fail_next_lists(1);
        let err = calendar.list("cal", date(2022, 3, 1), date(2022, 4, 1)).unwrap_err();
        assert_eq!(err.code(), CalendarErrorCode::Transient);
        assert!(calendar.list("cal", date(2022, 3, 1), date(2022, 4, 1)).is_ok());

        calendar.fail_inserts_for("https://ttc.ca/a");
        let payload = payload(ClosureType::FullDay, date(2022, 3, 12), date(2022, 3, 13));
        let err = calendar.insert("cal", &payload).unwrap_err();
        assert_eq!(err.code(), CalendarErrorCode::Transient);
        assert!(calendar.events().is_empty());
    }
}
