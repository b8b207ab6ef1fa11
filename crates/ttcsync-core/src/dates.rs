//! Effective-date parsing.
//!
//! Advisory subtitles are loosely formatted text such as
//! `"March 12, 2022 to March 13, 2022"` or `"March 19, 2022 - 12:00 AM to
//! 12:00 AM"`. Only `Month D, YYYY` tokens are considered; everything else in
//! the subtitle is ignored.

use std::sync::LazyLock;

use chrono::{Datelike, Month, NaiveDate};
use regex::Regex;
use thiserror::Error;

/// Matches a `Month D, YYYY` token.
static DATE_TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Z][a-z]+ \d{1,2}, \d{4}").expect("Invalid date token regex")
});

/// chrono format for a date token. `%d` accepts an unpadded day.
///
/// `%B` also accepts abbreviations when parsing, so the month word is
/// checked separately.
const DATE_TOKEN_FORMAT: &str = "%B %d, %Y";

/// Errors produced while parsing an effective-date subtitle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    /// The subtitle holds no date token, or more than two.
    #[error("unexpected amount of dates ({count}) in subtitle: {subtitle:?}")]
    Format { subtitle: String, count: usize },

    /// A date token could not be turned into a calendar date.
    #[error("unable to parse date {text:?}: {source}")]
    Parse {
        text: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A date token names its month with something other than the full
    /// English month name.
    #[error("unable to parse date {text:?}: expected full month name {expected:?}")]
    MonthName { text: String, expected: &'static str },
}

/// Extracts the start and end dates from an effective-date subtitle.
///
/// A single date token yields a one-day range. The returned pair is not
/// checked for ordering.
///
/// # Errors
///
/// Returns [`DateRangeError::Format`] when the subtitle holds zero or more
/// than two date tokens, and [`DateRangeError::Parse`] when a token is not a
/// real date (unknown month name, day out of range), or
/// [`DateRangeError::MonthName`] when the month is abbreviated.
pub fn parse_date_range(subtitle: &str) -> Result<(NaiveDate, NaiveDate), DateRangeError> {
    let tokens: Vec<&str> = DATE_TOKEN_REGEX
        .find_iter(subtitle)
        .map(|m| m.as_str())
        .collect();

    let (first, second) = match tokens.as_slice() {
        [only] => (*only, None),
        [first, second] => (*first, Some(*second)),
        _ => {
            return Err(DateRangeError::Format {
                subtitle: subtitle.to_string(),
                count: tokens.len(),
            });
        }
    };

    let start = parse_date_token(first)?;
    let end = match second {
        Some(token) => parse_date_token(token)?,
        None => start,
    };

    Ok((start, end))
}

fn parse_date_token(token: &str) -> Result<NaiveDate, DateRangeError> {
    let text = token.trim();
    let date = NaiveDate::parse_from_str(text, DATE_TOKEN_FORMAT)
        .map_err(|source| DateRangeError::Parse {
            text: text.to_string(),
            source,
        })?;

    let expected = Month::try_from(date.month() as u8)
        .map(|month| month.name())
        .unwrap_or_default();
    let word = text.split(' ').next().unwrap_or_default();
    if word != expected {
        return Err(DateRangeError::MonthName {
            text: text.to_string(),
            expected,
        });
    }

    Ok(date)
}
