//! The advisory event type.
//!
//! An [`Event`] is what one service advisory turns into once extracted: a
//! summary line, the advisory link and a closure pattern over an inclusive
//! range of calendar days.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::closure::ClosureType;

/// A service disruption ready to be written to a calendar.
///
/// The `uri` is the identity key: two events with the same `uri` describe the
/// same advisory, even when the summary or dates changed between revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Human-readable text, `"<route> - <title>"`.
    pub summary: String,
    /// Canonical link to the advisory.
    pub uri: String,
    /// The time pattern of the disruption.
    pub closure_type: ClosureType,
    /// First affected day.
    pub start: NaiveDate,
    /// Last affected day (inclusive).
    pub end: NaiveDate,
}

impl Event {
    /// Creates a new event.
    pub fn new(
        summary: impl Into<String>,
        uri: impl Into<String>,
        closure_type: ClosureType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            summary: summary.into(),
            uri: uri.into(),
            closure_type,
            start,
            end,
        }
    }

    /// Returns true if `start <= end`.
    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    /// Number of calendar days covered, counting both ends.
    ///
    /// Returns 0 for an unordered range.
    pub fn day_count(&self) -> u64 {
        if !self.is_ordered() {
            return 0;
        }
        (self.end - self.start).num_days() as u64 + 1
    }

    /// The day after `end`, i.e. the exclusive end of the range.
    pub fn exclusive_end(&self) -> NaiveDate {
        self.end.checked_add_days(Days::new(1)).unwrap_or(self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Event {
        Event::new(
            "Line 1 - Finch to Eglinton nightly early closures March 7 to 10",
            "https://ttc.ca/service-advisories/subway-service/a",
            ClosureType::NightOnly,
            date(2022, 3, 7),
            date(2022, 3, 10),
        )
    }

    #[test]
    fn day_count_is_inclusive() {
        assert_eq!(sample().day_count(), 4);

        let mut single = sample();
        single.end = single.start;
        assert_eq!(single.day_count(), 1);
    }

    #[test]
    fn unordered_range() {
        let mut event = sample();
        event.end = date(2022, 3, 6);
        assert!(!event.is_ordered());
        assert_eq!(event.day_count(), 0);
    }

    #[test]
    fn exclusive_end_crosses_month() {
        let mut event = sample();
        event.end = date(2022, 3, 31);
        assert_eq!(event.exclusive_end(), date(2022, 4, 1));
    }

    #[test]
    fn serde_roundtrip() {
        let event = sample();
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"closure_type\":\"night_only\""));
        assert!(json.contains("\"start\":\"2022-03-07\""));
        let parsed: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, parsed);
    }
}
