//! Markup adapter for advisory fragments.
//!
//! Everything that depends on the advisory page markup (CSS class names,
//! route label casing, the host used to absolutize links) lives here, so a
//! markup change only needs a new [`AdvisoryMarkup`] version and leaves
//! classification and date parsing untouched.

use scraper::{Html, Selector};

use crate::error::{AdvisoryError, AdvisoryResult};

/// Host prefixed to relative advisory links.
pub const DEFAULT_HOST_PREFIX: &str = "https://ttc.ca";

/// CSS selectors locating the advisory fields in a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupSelectors {
    /// The advisory link (first match wins).
    pub link: String,
    /// The advisory title.
    pub title: String,
    /// The route label.
    pub route: String,
    /// The effective-date subtitle.
    pub effective_date: String,
}

impl Default for MarkupSelectors {
    /// Selectors of the 2022 TTC search widget.
    fn default() -> Self {
        Self {
            link: "a".to_string(),
            title: ".field-satitle".to_string(),
            route: ".field-routename".to_string(),
            effective_date: ".sa-effective-date".to_string(),
        }
    }
}

/// How the route label is rewritten before it enters the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RouteCasing {
    /// Use the label as published.
    AsIs,
    /// Upper-case the first letter of every word (`line 1` becomes `Line 1`).
    #[default]
    TitleCase,
}

/// A versioned description of the advisory fragment markup.
#[derive(Debug, Clone)]
pub struct AdvisoryMarkup {
    version: String,
    link: Selector,
    title: Selector,
    route: Selector,
    effective_date: Selector,
    route_casing: RouteCasing,
    host_prefix: String,
}

impl AdvisoryMarkup {
    /// Version tag of the built-in TTC markup.
    pub const TTC_V1: &'static str = "ttc-v1";

    /// Creates a markup adapter from raw selectors.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisoryError::InvalidSelector`] if a selector does not parse.
    pub fn new(
        version: impl Into<String>,
        selectors: &MarkupSelectors,
        route_casing: RouteCasing,
        host_prefix: impl Into<String>,
    ) -> AdvisoryResult<Self> {
        Ok(Self {
            version: version.into(),
            link: parse_selector(&selectors.link)?,
            title: parse_selector(&selectors.title)?,
            route: parse_selector(&selectors.route)?,
            effective_date: parse_selector(&selectors.effective_date)?,
            route_casing,
            host_prefix: host_prefix.into(),
        })
    }

    /// The markup of the TTC subway advisory search widget.
    pub fn ttc_v1() -> Self {
        Self::new(
            Self::TTC_V1,
            &MarkupSelectors::default(),
            RouteCasing::TitleCase,
            DEFAULT_HOST_PREFIX,
        )
        .expect("built-in advisory selectors are valid")
    }

    /// Builder: replace the host prefix.
    pub fn with_host_prefix(mut self, host_prefix: impl Into<String>) -> Self {
        self.host_prefix = host_prefix.into();
        self
    }

    /// Returns the version tag.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the host prefix.
    pub fn host_prefix(&self) -> &str {
        &self.host_prefix
    }

    /// Returns the `href` of the first link, if any.
    pub fn link<'a>(&self, fragment: &'a Html) -> Option<&'a str> {
        fragment
            .select(&self.link)
            .next()
            .and_then(|anchor| anchor.value().attr("href"))
    }

    /// Returns the advisory title.
    pub fn title(&self, fragment: &Html) -> String {
        text_of(fragment, &self.title).trim().to_string()
    }

    /// Returns the route label, with the configured casing applied.
    pub fn route(&self, fragment: &Html) -> String {
        let label = text_of(fragment, &self.route);
        let label = label.trim();
        match self.route_casing {
            RouteCasing::AsIs => label.to_string(),
            RouteCasing::TitleCase => title_case(label),
        }
    }

    /// Returns the raw effective-date subtitle text.
    pub fn effective_date(&self, fragment: &Html) -> String {
        text_of(fragment, &self.effective_date)
    }

    /// Turns an advisory `href` into the absolute identity URI.
    pub fn absolute_uri(&self, href: &str) -> String {
        if href.starts_with("https://") || href.starts_with("http://") {
            href.to_string()
        } else {
            format!("{}{}", self.host_prefix, href)
        }
    }
}

impl Default for AdvisoryMarkup {
    fn default() -> Self {
        Self::ttc_v1()
    }
}

fn parse_selector(css: &str) -> AdvisoryResult<Selector> {
    Selector::parse(css).map_err(|e| AdvisoryError::InvalidSelector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// Concatenates the text of every element matching `selector`.
fn text_of(fragment: &Html, selector: &Selector) -> String {
    fragment
        .select(selector)
        .flat_map(|element| element.text())
        .collect()
}

/// Upper-cases the first letter of every word.
///
/// A word starts after whitespace or ASCII punctuation, so
/// `line 1 (yonge-university)` becomes `Line 1 (Yonge-University)`. Other
/// letters are left untouched.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous = ' ';
    for c in text.chars() {
        if is_word_separator(previous) {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        previous = c;
    }
    out
}

fn is_word_separator(c: char) -> bool {
    if c.is_ascii() {
        !(c.is_ascii_alphanumeric() || c == '_')
    } else {
        c.is_whitespace()
    }
}
