//! Closure classification for service advisories.
//!
//! Advisory titles carry the only hint about the time pattern of a
//! disruption. [`classify`] maps a title to a [`ClosureType`] with plain,
//! case-sensitive substring checks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phrases marking a closure that spans whole days.
const FULL_DAY_PHRASES: &[&str] = &["weekend closure", "single day closure"];

/// Phrase marking a closure that repeats every night.
const NIGHT_ONLY_PHRASE: &str = "nightly early closures";

/// The time pattern of a disruption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureType {
    /// The title matched no known phrase.
    #[default]
    Undefined,
    /// Service is closed for whole calendar days.
    FullDay,
    /// Service closes early every night of the range.
    NightOnly,
}

impl ClosureType {
    /// Returns a human-readable name for this closure type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::FullDay => "full day",
            Self::NightOnly => "night only",
        }
    }
}

impl fmt::Display for ClosureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies an advisory title.
///
/// Full-day phrases win over the nightly phrase when a title contains both.
pub fn classify(title: &str) -> ClosureType {
    if FULL_DAY_PHRASES.iter().any(|phrase| title.contains(phrase)) {
        ClosureType::FullDay
    } else if title.contains(NIGHT_ONLY_PHRASE) {
        ClosureType::NightOnly
    } else {
        ClosureType::Undefined
    }
}
