//! Search query parameters and URL building.
//!
//! The advisory landing page embeds the search widget configuration as JSON
//! in a `data-properties` attribute. [`extract_query_parameters`] reads it and
//! [`QueryParameters::to_url`] turns it into the search API URL.

use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use crate::error::{AdvisoryError, AdvisoryResult};

/// CSS selector of the node carrying the widget configuration.
pub const SEARCH_RESULTS_SELECTOR: &str = ".search-results";

/// Attribute holding the JSON-encoded [`QueryParameters`].
pub const PROPERTIES_ATTRIBUTE: &str = "data-properties";

/// Search widget configuration as embedded in the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueryParameters {
    /// Search API endpoint.
    pub endpoint: String,
    #[serde(default)]
    pub v: String,
    #[serde(default)]
    pub s: String,
    #[serde(default)]
    pub l: String,
    /// Page size.
    #[serde(default)]
    pub p: i64,
    #[serde(default, rename = "defaultSortOrder")]
    pub default_sort_order: String,
    #[serde(default)]
    pub sig: String,
    #[serde(default, rename = "itemid", alias = "itemId")]
    pub item_id: String,
    #[serde(default, rename = "autoFireSearch")]
    pub auto_fire_search: bool,
}

impl QueryParameters {
    /// Decodes the JSON payload of the `data-properties` attribute.
    pub fn from_json(json: &str) -> AdvisoryResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            AdvisoryError::parameter_extraction(format!(
                "failed to decode {}: {}",
                PROPERTIES_ATTRIBUTE, e
            ))
        })
    }

    /// Returns the query pairs sent to the search API, in wire order.
    fn query_pairs(&self) -> [(&'static str, String); 8] {
        [
            ("v", self.v.clone()),
            ("s", self.s.clone()),
            ("l", self.l.clone()),
            ("p", self.p.to_string()),
            ("defaultSortOrder", self.default_sort_order.clone()),
            ("sig", self.sig.clone()),
            ("itemid", self.item_id.clone()),
            ("autoFireSearch", self.auto_fire_search.to_string()),
        ]
    }

    /// Builds the search API URL.
    ///
    /// Pairs already present on the endpoint are kept. All pairs are
    /// form-urlencoded and emitted sorted by key, so equal parameters always
    /// give the same URL.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisoryError::MalformedEndpoint`] when the endpoint is not an
    /// absolute URL.
    pub fn to_url(&self) -> AdvisoryResult<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|source| {
            AdvisoryError::MalformedEndpoint {
                endpoint: self.endpoint.clone(),
                source,
            }
        })?;

        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.extend(
            self.query_pairs()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v)),
        );
        // Stable sort keeps repeated keys in insertion order.
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        url.query_pairs_mut().clear().extend_pairs(pairs);
        Ok(url)
    }
}

/// Reads the [`QueryParameters`] out of the landing page HTML.
///
/// # Errors
///
/// Returns [`AdvisoryError::ParameterExtraction`] when the node or its
/// attribute is missing, or when the attribute is not valid JSON.
pub fn extract_query_parameters(landing_page: &str) -> AdvisoryResult<QueryParameters> {
    let document = Html::parse_document(landing_page);
    let selector =
        Selector::parse(SEARCH_RESULTS_SELECTOR).map_err(|e| AdvisoryError::InvalidSelector {
            selector: SEARCH_RESULTS_SELECTOR.to_string(),
            message: format!("{:?}", e),
        })?;

    let node = document.select(&selector).next().ok_or_else(|| {
        AdvisoryError::parameter_extraction(format!(
            "no {} node in landing page",
            SEARCH_RESULTS_SELECTOR
        ))
    })?;

    let properties = node.value().attr(PROPERTIES_ATTRIBUTE).ok_or_else(|| {
        AdvisoryError::parameter_extraction(format!(
            "no {} attribute on {} node",
            PROPERTIES_ATTRIBUTE, SEARCH_RESULTS_SELECTOR
        ))
    })?;

    QueryParameters::from_json(properties)
}
