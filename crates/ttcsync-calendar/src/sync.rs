//! Calendar synchronization.
//!
//! [`CalendarSync`] decides which extracted events still need to be created
//! in the destination calendar and creates them:
//!
//! 1. compute the [`SyncWindow`] spanning the whole batch
//! 2. list the events already in the calendar for that window
//! 3. drop every event whose URI is already some event's description
//! 4. build a payload for each remaining event and insert it
//!
//! The calendar itself is the only record of previous runs. Identity is the
//! advisory URI alone, so a reworded title or moved dates never produce a
//! second event.

use std::collections::HashSet;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};
use ttcsync_core::{Event, RetryPolicy};

use crate::client::{CalendarClient, CreatedEvent};
use crate::error::{CalendarError, CalendarResult};
use crate::payload::{DEFAULT_TIME_ZONE, EventPayload};

/// Settings for a sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Destination calendar.
    pub calendar_id: String,
    /// Time zone of night-only events.
    pub time_zone: String,
    /// Log and record payloads instead of inserting them.
    pub dry_run: bool,
    /// Retry schedule for listing existing events.
    pub list_retry: RetryPolicy,
}

impl SyncConfig {
    /// Creates a config for the given calendar with default settings.
    pub fn new(calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            dry_run: false,
            list_retry: RetryPolicy::default(),
        }
    }

    /// Builder method to set the time zone.
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    /// Builder method to enable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builder method to set the listing retry schedule.
    pub fn with_list_retry(mut self, retry: RetryPolicy) -> Self {
        self.list_retry = retry;
        self
    }
}

/// Date window covering a batch of events; `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncWindow {
    /// Earliest start date.
    pub start: NaiveDate,
    /// The day after the latest end date.
    pub end: NaiveDate,
}

impl SyncWindow {
    /// Computes the window for a batch, or `None` for an empty batch.
    pub fn for_events(events: &[Event]) -> Option<Self> {
        let start = events.iter().map(|e| e.start).min()?;
        let last = events.iter().map(|e| e.end).max()?;
        let end = last.checked_add_days(Days::new(1))?;
        Some(Self { start, end })
    }
}

/// An event that was not written to the calendar.
#[derive(Debug)]
pub struct FailedEvent {
    /// Advisory URI of the event.
    pub uri: String,
    /// Why it was not written.
    pub error: CalendarError,
}

/// Outcome of a sync run.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Window that was listed, `None` for an empty batch.
    pub window: Option<SyncWindow>,
    /// Events created in this run.
    pub inserted: Vec<CreatedEvent>,
    /// URIs skipped because the calendar (or this batch) already has them.
    pub already_present: Vec<String>,
    /// Events that cannot be expressed as calendar events.
    pub rejected: Vec<FailedEvent>,
    /// Events whose insert failed.
    pub failed: Vec<FailedEvent>,
    /// Payloads that would have been inserted in dry-run mode.
    pub dry_run_payloads: Vec<EventPayload>,
}

impl SyncReport {
    /// Returns true if no event was rejected and no insert failed.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.failed.is_empty()
    }
}

/// Synchronizes events into a calendar.
#[derive(Debug)]
pub struct CalendarSync<C> {
    client: C,
    config: SyncConfig,
}

impl<C: CalendarClient> CalendarSync<C> {
    /// Creates a sync over the given client.
    pub fn new(client: C, config: SyncConfig) -> Self {
        Self { client, config }
    }

    /// Returns the calendar client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the sync settings.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Inserts every event of the batch that the calendar does not have yet.
    ///
    /// # Errors
    ///
    /// Only a failure to list existing events aborts the run. Rejected events
    /// and failed inserts are logged and collected in the [`SyncReport`].
    pub async fn sync(&self, events: &[Event]) -> CalendarResult<SyncReport> {
        let Some(window) = SyncWindow::for_events(events) else {
            info!("no events to sync");
            return Ok(SyncReport::default());
        };

        let mut report = SyncReport {
            window: Some(window),
            ..SyncReport::default()
        };

        let mut known = self.existing_uris(window).await?;
        debug!("{} existing events in window", known.len());

        for event in events {
            if known.contains(&event.uri) {
                debug!(uri = %event.uri, "already in calendar");
                report.already_present.push(event.uri.clone());
                continue;
            }

            let payload = match EventPayload::from_event(event, &self.config.time_zone) {
                Ok(payload) => payload,
                Err(error) => {
                    warn!("{}", error);
                    report.rejected.push(FailedEvent {
                        uri: event.uri.clone(),
                        error,
                    });
                    continue;
                }
            };

            if self.config.dry_run {
                info!(
                    "dry run, would insert: {}",
                    serde_json::to_string(&payload).unwrap_or_else(|_| payload.summary.clone())
                );
                report.dry_run_payloads.push(payload);
                known.insert(event.uri.clone());
                continue;
            }

            match self
                .client
                .insert_event(&self.config.calendar_id, &payload)
                .await
            {
                Ok(created) => {
                    info!("added event: {}", payload.summary);
                    report.inserted.push(created);
                    known.insert(event.uri.clone());
                }
                Err(error) => {
                    warn!(uri = %event.uri, "insert failed: {}", error);
                    report.failed.push(FailedEvent {
                        uri: event.uri.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            "sync done: {} inserted, {} already present, {} rejected, {} failed{}",
            report.inserted.len(),
            report.already_present.len(),
            report.rejected.len(),
            report.failed.len(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );
        Ok(report)
    }

    /// Lists the identity keys already present in the window, retrying
    /// transient failures.
    async fn existing_uris(&self, window: SyncWindow) -> CalendarResult<HashSet<String>> {
        let mut failures = 0;
        loop {
            let result = self
                .client
                .list_events(&self.config.calendar_id, window.start, window.end)
                .await;

            match result {
                Ok(existing) => {
                    return Ok(existing
                        .into_iter()
                        .filter_map(|event| event.description)
                        .collect());
                }
                Err(err) if err.is_retryable() => {
                    failures += 1;
                    match self.config.list_retry.delay_after(failures) {
                        Some(delay) => {
                            warn!(
                                "listing {} failed (attempt {}): {}; retrying in {:?}",
                                self.config.calendar_id, failures, err, delay
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(err),
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ttcsync_core::ClosureType;

    use super::*;
    use crate::client::ExistingEvent;
    use crate::error::CalendarErrorCode;
    use crate::memory::MemoryCalendar;

    const CALENDAR: &str = "closures@group.calendar.google.com";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn event(uri: &str, closure_type: ClosureType, start: NaiveDate, end: NaiveDate) -> Event {
        Event::new(format!("Line 1 - {}", uri), uri, closure_type, start, end)
    }

    fn batch() -> Vec<Event> {
        vec![
            event("https://ttc.ca/a", ClosureType::FullDay, date(2022, 3, 12), date(2022, 3, 13)),
            event("https://ttc.ca/b", ClosureType::NightOnly, date(2022, 3, 7), date(2022, 3, 10)),
        ]
    }

    fn sync_over(calendar: MemoryCalendar) -> CalendarSync<MemoryCalendar> {
        CalendarSync::new(calendar, SyncConfig::new(CALENDAR))
    }

    #[test]
    fn window_spans_batch() {
        let window = SyncWindow::for_events(&batch()).unwrap();
        assert_eq!(window.start, date(2022, 3, 7));
        assert_eq!(window.end, date(2022, 3, 14));

        assert!(SyncWindow::for_events(&[]).is_none());
    }

    #[tokio::test]
    async fn inserts_only_missing_events() {
        let calendar = MemoryCalendar::new();
        calendar.seed(CALENDAR, ExistingEvent::new("x").with_description("https://ttc.ca/a"));

        let sync = sync_over(calendar);
        let report = sync.sync(&batch()).await.unwrap();

        assert_eq!(report.already_present, vec!["https://ttc.ca/a"]);
        assert_eq!(report.inserted.len(), 1);

        let stored = sync.client().events();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].payload.description, "https://ttc.ca/b");
        assert_eq!(stored[0].calendar_id, CALENDAR);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn second_run_inserts_nothing() {
        let sync = sync_over(MemoryCalendar::new());

        let first = sync.sync(&batch()).await.unwrap();
        assert_eq!(first.inserted.len(), 2);

        let second = sync.sync(&batch()).await.unwrap();
        assert!(second.inserted.is_empty());
        assert_eq!(second.already_present.len(), 2);
        assert_eq!(sync.client().insert_calls(), 2);
    }

    #[tokio::test]
    async fn identity_is_the_uri() {
        let sync = sync_over(MemoryCalendar::new());
        sync.sync(&batch()).await.unwrap();

        let mut reworded = batch();
        reworded[0].summary = "Line 1 - rescheduled weekend closure".to_string();
        let report = sync.sync(&reworded).await.unwrap();
        assert!(report.inserted.is_empty());
    }

    #[tokio::test]
    async fn duplicate_uris_in_batch_insert_once() {
        let sync = sync_over(MemoryCalendar::new());
        let mut events = batch();
        events.push(events[0].clone());

        let report = sync.sync(&events).await.unwrap();
        assert_eq!(report.inserted.len(), 2);
        assert_eq!(report.already_present, vec!["https://ttc.ca/a"]);
    }

    #[tokio::test]
    async fn duplicate_of_rejected_event_is_tried_again() {
        let uri = "https://ttc.ca/a";
        let events = vec![
            event(uri, ClosureType::Undefined, date(2022, 3, 12), date(2022, 3, 13)),
            event(uri, ClosureType::FullDay, date(2022, 3, 12), date(2022, 3, 13)),
        ];

        let sync = sync_over(MemoryCalendar::new());
        let report = sync.sync(&events).await.unwrap();

        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.inserted.len(), 1);
        assert!(report.already_present.is_empty());
    }

    #[tokio::test]
    async fn duplicate_of_failed_insert_is_not_already_present() {
        let calendar = MemoryCalendar::new();
        calendar.fail_inserts_for("https://ttc.ca/a");
        let mut events = batch();
        events.push(events[0].clone());

        let sync = sync_over(calendar);
        let report = sync.sync(&events).await.unwrap();

        assert!(report.already_present.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed.iter().all(|f| f.uri == "https://ttc.ca/a"));
        assert_eq!(report.inserted.len(), 1);
    }

    #[tokio::test]
    async fn dry_run_duplicates_are_logged_once() {
        let sync = CalendarSync::new(
            MemoryCalendar::new(),
            SyncConfig::new(CALENDAR).with_dry_run(true),
        );
        let mut events = batch();
        events.push(events[1].clone());

        let report = sync.sync(&events).await.unwrap();
        assert_eq!(report.dry_run_payloads.len(), 2);
        assert_eq!(report.already_present, vec!["https://ttc.ca/b"]);
    }

    #[tokio::test]
    async fn empty_batch_makes_no_calls() {
        let sync = sync_over(MemoryCalendar::new());
        let report = sync.sync(&[]).await.unwrap();

        assert!(report.window.is_none());
        assert!(report.inserted.is_empty());
        assert_eq!(sync.client().list_calls(), 0);
        assert_eq!(sync.client().insert_calls(), 0);
    }

    #[tokio::test]
    async fn dry_run_never_inserts() {
        let sync = CalendarSync::new(
            MemoryCalendar::new(),
            SyncConfig::new(CALENDAR).with_dry_run(true),
        );
        let report = sync.sync(&batch()).await.unwrap();

        assert_eq!(report.dry_run_payloads.len(), 2);
        assert!(report.inserted.is_empty());
        assert_eq!(sync.client().insert_calls(), 0);
        assert_eq!(sync.client().list_calls(), 1);
        assert_eq!(
            report.dry_run_payloads[1].recurrence,
            vec!["RRULE:FREQ=DAILY;COUNT=4"]
        );
    }

    #[tokio::test]
    async fn undefined_is_rejected_and_sync_continues() {
        let mut events = vec![event(
            "https://ttc.ca/elevator",
            ClosureType::Undefined,
            date(2022, 3, 1),
            date(2022, 3, 1),
        )];
        events.extend(batch());

        let sync = sync_over(MemoryCalendar::new());
        let report = sync.sync(&events).await.unwrap();

        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].uri, "https://ttc.ca/elevator");
        assert_eq!(
            report.rejected[0].error.code(),
            CalendarErrorCode::InvalidEvent
        );
        assert_eq!(report.inserted.len(), 2);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn insert_failure_does_not_stop_later_inserts() {
        let calendar = MemoryCalendar::new();
        calendar.fail_inserts_for("https://ttc.ca/a");

        let sync = sync_over(calendar);
        let report = sync.sync(&batch()).await.unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].uri, "https://ttc.ca/a");
        assert_eq!(report.inserted.len(), 1);
        assert_eq!(sync.client().events()[0].payload.description, "https://ttc.ca/b");
    }

    #[tokio::test(start_paused = true)]
    async fn transient_listing_failures_are_retried() {
        let calendar = MemoryCalendar::new();
        calendar.fail_next_lists(2);

        let sync = sync_over(calendar);
        let report = sync.sync(&batch()).await.unwrap();

        assert_eq!(sync.client().list_calls(), 3);
        assert_eq!(report.inserted.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn listing_failure_is_fatal() {
        let calendar = MemoryCalendar::new();
        calendar.fail_next_lists(5);

        let sync = sync_over(calendar);
        let err = sync.sync(&batch()).await.unwrap_err();

        assert_eq!(err.code(), CalendarErrorCode::Transient);
        assert_eq!(sync.client().list_calls(), 3);
        assert_eq!(sync.client().insert_calls(), 0);
    }

    #[test]
    fn config_builder() {
        let config = SyncConfig::new(CALENDAR)
            .with_time_zone("America/Vancouver")
            .with_dry_run(true)
            .with_list_retry(RetryPolicy::none());

        assert_eq!(config.time_zone, "America/Vancouver");
        assert!(config.dry_run);
        assert_eq!(config.list_retry.max_attempts, 1);
        assert_eq!(SyncConfig::new(CALENDAR).time_zone, "America/Toronto");
    }
}
