//! Advisory to event extraction.
//!
//! [`EventExtractor`] reads one advisory fragment through an
//! [`AdvisoryMarkup`], classifies its title and parses its effective dates.
//! [`EventExtractor::extract_all`] runs it over a batch and keeps going past
//! broken advisories, collecting them in the [`ExtractionReport`].

use scraper::Html;
use tracing::{debug, warn};
use ttcsync_core::{Event, classify, parse_date_range};

use crate::error::{AdvisoryError, AdvisoryResult};
use crate::markup::AdvisoryMarkup;
use crate::results::RawAdvisory;

/// An advisory that could not be turned into an event.
#[derive(Debug)]
pub struct SkippedAdvisory {
    /// Position of the advisory in the batch.
    pub index: usize,
    /// Server-side identifier, when the envelope carried one.
    pub id: Option<String>,
    /// Why it was skipped.
    pub error: AdvisoryError,
}

/// Outcome of extracting a batch of advisories.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Successfully extracted events, in batch order.
    pub events: Vec<Event>,
    /// Advisories that were skipped.
    pub skipped: Vec<SkippedAdvisory>,
}

impl ExtractionReport {
    /// Returns the number of skipped advisories.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Turns advisory fragments into [`Event`]s.
#[derive(Debug, Clone, Default)]
pub struct EventExtractor {
    markup: AdvisoryMarkup,
}

impl EventExtractor {
    /// Creates an extractor for the given markup.
    pub fn new(markup: AdvisoryMarkup) -> Self {
        debug!(
            version = markup.version(),
            host_prefix = markup.host_prefix(),
            "using advisory markup"
        );
        Self { markup }
    }

    /// Returns the markup adapter in use.
    pub fn markup(&self) -> &AdvisoryMarkup {
        &self.markup
    }

    /// Extracts the event described by one advisory.
    ///
    /// # Errors
    ///
    /// - [`AdvisoryError::LinkNotFound`] if the fragment has no link
    /// - [`AdvisoryError::DateRange`] if the effective dates do not parse
    /// - [`AdvisoryError::InvalidDateRange`] if the advisory ends before it starts
    pub fn extract(&self, advisory: &RawAdvisory) -> AdvisoryResult<Event> {
        self.extract_fragment(&advisory.html)
    }

    /// Extracts the event described by an HTML fragment.
    pub fn extract_fragment(&self, html: &str) -> AdvisoryResult<Event> {
        let fragment = Html::parse_fragment(html);

        let href = self
            .markup
            .link(&fragment)
            .ok_or(AdvisoryError::LinkNotFound)?;
        let uri = self.markup.absolute_uri(href);

        let title = self.markup.title(&fragment);
        let route = self.markup.route(&fragment);
        let closure_type = classify(&title);

        let (start, end) = parse_date_range(&self.markup.effective_date(&fragment))?;
        let event = Event::new(
            format!("{} - {}", route, title),
            uri,
            closure_type,
            start,
            end,
        );
        if !event.is_ordered() {
            return Err(AdvisoryError::InvalidDateRange { start, end });
        }

        Ok(event)
    }

    /// Extracts every advisory of a batch, skipping the ones that fail.
    pub fn extract_all(&self, advisories: &[RawAdvisory]) -> ExtractionReport {
        let mut report = ExtractionReport::default();

        for (index, advisory) in advisories.iter().enumerate() {
            match self.extract(advisory) {
                Ok(event) => {
                    debug!(
                        uri = %event.uri,
                        closure_type = %event.closure_type,
                        "extracted advisory"
                    );
                    report.events.push(event);
                }
                Err(error) => {
                    warn!(
                        index,
                        id = advisory.id.as_deref().unwrap_or("-"),
                        "skipping advisory: {}",
                        error
                    );
                    report.skipped.push(SkippedAdvisory {
                        index,
                        id: advisory.id.clone(),
                        error,
                    });
                }
            }
        }

        if !report.skipped.is_empty() {
            warn!(
                "skipped {} of {} advisories",
                report.skipped.len(),
                advisories.len()
            );
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use ttcsync_core::{ClosureType, DateRangeError};

    use super::*;
    use crate::results::decode_search_results;
    use crate::source::CANNED_SEARCH_RESULTS;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fragment(href: Option<&str>, title: &str, dates: &str) -> String {
        let link = match href {
            Some(href) => format!(r#"<a href="{}">"#, href),
            None => "<a>".to_string(),
        };
        format!(
            r#"{link}<div><span class="field-routename">line 2</span><span class="field-satitle">{title}</span></div></a><div class="sa-effective-date">{dates}</div>"#
        )
    }

    #[test]
    fn extracts_weekend_closure() {
        let extractor = EventExtractor::default();
        let html = fragment(
            Some("/service-advisories/subway-service/weekend"),
            "Kipling to Islington weekend closure",
            "March 12, 2022 to March 13, 2022",
        );
        let event = extractor.extract_fragment(&html).unwrap();

        assert_eq!(event.summary, "Line 2 - Kipling to Islington weekend closure");
        assert_eq!(
            event.uri,
            "https://ttc.ca/service-advisories/subway-service/weekend"
        );
        assert_eq!(event.closure_type, ClosureType::FullDay);
        assert_eq!(event.start, date(2022, 3, 12));
        assert_eq!(event.end, date(2022, 3, 13));
    }

    #[test]
    fn undefined_closure_is_still_extracted() {
        let extractor = EventExtractor::default();
        let html = fragment(Some("/x"), "Elevator out of service", "April 2, 2022");
        let event = extractor.extract_fragment(&html).unwrap();
        assert_eq!(event.closure_type, ClosureType::Undefined);
        assert_eq!(event.start, event.end);
    }

    #[test]
    fn missing_link() {
        let extractor = EventExtractor::default();
        let html = fragment(None, "weekend closure", "March 12, 2022");
        let err = extractor.extract_fragment(&html).unwrap_err();
        assert!(matches!(err, AdvisoryError::LinkNotFound));
    }

    #[test]
    fn missing_dates() {
        let extractor = EventExtractor::default();
        let html = fragment(Some("/x"), "weekend closure", "Until further notice");
        let err = extractor.extract_fragment(&html).unwrap_err();
        assert!(matches!(
            err,
            AdvisoryError::DateRange(DateRangeError::Format { .. })
        ));
    }

    #[test]
    fn reversed_dates_are_rejected() {
        let extractor = EventExtractor::default();
        let html = fragment(
            Some("/x"),
            "weekend closure",
            "March 13, 2022 to March 12, 2022",
        );
        let err = extractor.extract_fragment(&html).unwrap_err();
        assert!(matches!(err, AdvisoryError::InvalidDateRange { .. }));
    }

    #[test]
    fn extracts_canned_batch() {
        let results = decode_search_results(CANNED_SEARCH_RESULTS).unwrap();
        let report = EventExtractor::default().extract_all(&results.results);

        assert_eq!(report.skipped_count(), 0);
        assert_eq!(report.events.len(), 5);

        let night_only = report
            .events
            .iter()
            .filter(|e| e.closure_type == ClosureType::NightOnly)
            .count();
        assert_eq!(night_only, 3);

        let single_day = &report.events[2];
        assert_eq!(
            single_day.summary,
            "Line 1 - Lawrence to St Clair single day closure March 19"
        );
        assert_eq!(single_day.closure_type, ClosureType::FullDay);
        assert_eq!(single_day.start, date(2022, 3, 19));
        assert_eq!(single_day.end, date(2022, 3, 19));

        let yonge = &report.events[3];
        assert!(yonge.summary.starts_with("Line 1 (Yonge-University) - Vaughan"));
        assert_eq!((yonge.start, yonge.end), (date(2022, 3, 21), date(2022, 3, 24)));
    }

    #[test]
    fn batch_continues_past_failures() {
        let advisories = vec![
            RawAdvisory::from_html(fragment(Some("/a"), "weekend closure", "March 12, 2022")),
            RawAdvisory {
                id: Some("broken".to_string()),
                ..RawAdvisory::from_html(fragment(None, "weekend closure", "March 12, 2022"))
            },
            RawAdvisory::from_html(fragment(Some("/c"), "weekend closure", "no dates")),
            RawAdvisory::from_html(fragment(
                Some("/d"),
                "nightly early closures",
                "March 7, 2022 to March 10, 2022",
            )),
        ];

        let report = EventExtractor::default().extract_all(&advisories);

        let uris: Vec<&str> = report.events.iter().map(|e| e.uri.as_str()).collect();
        assert_eq!(uris, vec!["https://ttc.ca/a", "https://ttc.ca/d"]);

        assert_eq!(report.skipped_count(), 2);
        assert_eq!(report.skipped[0].index, 1);
        assert_eq!(report.skipped[0].id.as_deref(), Some("broken"));
        assert!(matches!(report.skipped[0].error, AdvisoryError::LinkNotFound));
        assert_eq!(report.skipped[1].index, 2);
        assert!(matches!(
            report.skipped[1].error,
            AdvisoryError::DateRange(_)
        ));
    }
}
