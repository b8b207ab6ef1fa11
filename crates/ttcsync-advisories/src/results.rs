//! Search results envelope.

use serde::Deserialize;

use crate::error::{AdvisoryError, AdvisoryResult};

/// Response body of the search API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchResults {
    /// Number of matches reported by the server.
    #[serde(default)]
    pub count: Option<i64>,
    /// The advisories on this page.
    #[serde(default)]
    pub results: Vec<RawAdvisory>,
}

/// A single search result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawAdvisory {
    /// Server-side identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Site-relative URL of the advisory page.
    #[serde(default)]
    pub url: Option<String>,
    /// HTML fragment rendering the advisory.
    #[serde(default)]
    pub html: String,
}

impl RawAdvisory {
    /// Creates an advisory from its HTML fragment only.
    pub fn from_html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Default::default()
        }
    }
}

/// Decodes a search response body.
///
/// # Errors
///
/// Returns [`AdvisoryError::InvalidResponse`] when the body is not the
/// expected JSON envelope.
pub fn decode_search_results(body: &str) -> AdvisoryResult<SearchResults> {
    serde_json::from_str(body).map_err(|e| {
        AdvisoryError::invalid_response(format!("failed to decode search results: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::CANNED_SEARCH_RESULTS;

    #[test]
    fn decodes_canned_results() {
        let results = decode_search_results(CANNED_SEARCH_RESULTS).unwrap();
        assert_eq!(results.count, Some(5));
        assert_eq!(results.results.len(), 5);

        let first = &results.results[0];
        assert_eq!(
            first.id.as_deref(),
            Some("32e64882-7314-499e-9c42-162098528e23")
        );
        assert!(first.html.contains("field-satitle"));
    }

    #[test]
    fn missing_results_is_empty() {
        let results = decode_search_results("{}").unwrap();
        assert!(results.results.is_empty());
        assert_eq!(results.count, None);
    }

    #[test]
    fn null_name_and_unknown_fields_are_ignored() {
        let results =
            decode_search_results(r#"{"Results":[{"Name":null,"Language":"en","Html":"<a></a>"}]}"#)
                .unwrap();
        assert_eq!(results.results[0], RawAdvisory::from_html("<a></a>"));
    }

    #[test]
    fn invalid_body() {
        let err = decode_search_results("<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, AdvisoryError::InvalidResponse { .. }));
    }
}
