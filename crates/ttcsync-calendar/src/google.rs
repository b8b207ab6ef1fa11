//! Google Calendar API client.
//!
//! This module provides a small HTTP client for the two Calendar API v3
//! endpoints the sync needs: `events.list` and `events.insert`. It
//! authenticates with an already-issued bearer token.

use std::time::Duration;

use chrono::{NaiveDate, SecondsFormat};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::client::{BoxFuture, CalendarClient, CreatedEvent, ExistingEvent};
use crate::error::{CalendarError, CalendarResult};
use crate::payload::EventPayload;

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

const CLIENT_NAME: &str = "google";

/// Google Calendar API client.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    access_token: String,
    api_base: String,
}

impl GoogleCalendarClient {
    /// Creates a new Google Calendar client with the given access token.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token is empty or the HTTP
    /// client cannot be built.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> CalendarResult<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(
                CalendarError::configuration("access token is empty").with_client(CLIENT_NAME)
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                CalendarError::configuration(format!("failed to create HTTP client: {}", e))
                    .with_client(CLIENT_NAME)
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            access_token,
            api_base: CALENDAR_API_BASE.to_string(),
        })
    }

    /// Builder method to point the client at another API root.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(calendar_id)
        )
    }

    /// Lists events overlapping `[time_min, time_max)`, following every page.
    pub async fn list_all(
        &self,
        calendar_id: &str,
        time_min: NaiveDate,
        time_max: NaiveDate,
    ) -> CalendarResult<Vec<ExistingEvent>> {
        let time_min = utc_midnight(time_min)?;
        let time_max = utc_midnight(time_max)?;

        let mut all_events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_page(calendar_id, &time_min, &time_max, page_token.as_deref())
                .await?;

            all_events.extend(page.items.into_iter().filter_map(ApiEvent::into_existing));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            "found {} events in calendar {} between {} and {}",
            all_events.len(),
            calendar_id,
            time_min,
            time_max
        );
        Ok(all_events)
    }

    /// Fetches a single page of events.
    async fn list_page(
        &self,
        calendar_id: &str,
        time_min: &str,
        time_max: &str,
        page_token: Option<&str>,
    ) -> CalendarResult<EventListResponse> {
        let mut request = self
            .http_client
            .get(self.events_url(calendar_id))
            .bearer_auth(&self.access_token)
            .query(&[("timeMin", time_min), ("timeMax", time_max)]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(request_error)?;
        let body = read_body(response).await?;

        serde_json::from_str(&body).map_err(|e| {
            CalendarError::invalid_response(format!("failed to parse event list: {}", e))
                .with_client(CLIENT_NAME)
        })
    }

    /// Inserts one event.
    pub async fn insert(
        &self,
        calendar_id: &str,
        payload: &EventPayload,
    ) -> CalendarResult<CreatedEvent> {
        let body = serde_json::to_string(payload).map_err(|e| {
            CalendarError::invalid_event(format!("failed to serialize event: {}", e))
                .with_client(CLIENT_NAME)
        })?;

        let response = self
            .http_client
            .post(self.events_url(calendar_id))
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(request_error)?;

        let body = read_body(response).await?;
        let created: ApiCreatedEvent = serde_json::from_str(&body).map_err(|e| {
            CalendarError::invalid_response(format!("failed to parse created event: {}", e))
                .with_client(CLIENT_NAME)
        })?;

        Ok(CreatedEvent {
            id: created.id,
            summary: created.summary,
            html_link: created.html_link,
        })
    }
}

impl CalendarClient for GoogleCalendarClient {
    fn name(&self) -> &str {
        CLIENT_NAME
    }

    fn list_events<'a>(
        &'a self,
        calendar_id: &'a str,
        time_min: NaiveDate,
        time_max: NaiveDate,
    ) -> BoxFuture<'a, CalendarResult<Vec<ExistingEvent>>> {
        Box::pin(self.list_all(calendar_id, time_min, time_max))
    }

    fn insert_event<'a>(
        &'a self,
        calendar_id: &'a str,
        payload: &'a EventPayload,
    ) -> BoxFuture<'a, CalendarResult<CreatedEvent>> {
        Box::pin(self.insert(calendar_id, payload))
    }
}

/// Formats a date as midnight UTC in RFC 3339 (`2022-03-07T00:00:00Z`).
fn utc_midnight(date: NaiveDate) -> CalendarResult<String> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().to_rfc3339_opts(SecondsFormat::Secs, true))
        .ok_or_else(|| CalendarError::invalid_event(format!("no midnight on {}", date)))
}

fn request_error(e: reqwest::Error) -> CalendarError {
    let err = if e.is_timeout() {
        CalendarError::transient("request timeout")
    } else if e.is_connect() {
        CalendarError::transient(format!("connection failed: {}", e))
    } else {
        CalendarError::transient(format!("request failed: {}", e))
    };
    err.with_client(CLIENT_NAME).with_source(e)
}

/// Reads the body of a successful response, or maps the failure status.
async fn read_body(response: reqwest::Response) -> CalendarResult<String> {
    let status = response.status();

    if !status.is_success() {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, retry_after, &body).with_client(CLIENT_NAME));
    }

    response.text().await.map_err(|e| {
        CalendarError::transient(format!("failed to read response: {}", e))
            .with_client(CLIENT_NAME)
            .with_source(e)
    })
}

/// Maps a non-success status to a calendar error.
fn status_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> CalendarError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => CalendarError::transient(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )),
        StatusCode::UNAUTHORIZED => {
            CalendarError::rejected("access token expired or invalid")
        }
        StatusCode::FORBIDDEN => CalendarError::rejected("access denied to calendar"),
        StatusCode::NOT_FOUND => CalendarError::rejected("calendar not found"),
        StatusCode::BAD_REQUEST => {
            CalendarError::rejected(format!("request rejected: {}", body))
        }
        s if s.is_server_error() => {
            CalendarError::transient(format!("API error ({}): {}", status, body))
        }
        _ => CalendarError::rejected(format!("API error ({}): {}", status, body)),
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    description: Option<String>,
}

impl ApiEvent {
    fn into_existing(self) -> Option<ExistingEvent> {
        Some(ExistingEvent {
            id: self.id?,
            summary: self.summary,
            description: self.description,
        })
    }
}

/// Response from the events.insert endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCreatedEvent {
    id: String,
    summary: Option<String>,
    html_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalendarErrorCode;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn midnight_bounds() {
        assert_eq!(
            utc_midnight(date(2022, 3, 7)).unwrap(),
            "2022-03-07T00:00:00Z"
        );
    }

    #[test]
    fn events_url_encodes_calendar_id() {
        let client = GoogleCalendarClient::new("token", Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.events_url("abc@group.calendar.google.com"),
            format!(
                "{}/calendars/abc%40group.calendar.google.com/events",
                CALENDAR_API_BASE
            )
        );

        let client = client.with_api_base("http://localhost:8080/");
        assert_eq!(
            client.events_url("primary"),
            "http://localhost:8080/calendars/primary/events"
        );
    }

    #[test]
    fn empty_token_is_rejected() {
        let err = GoogleCalendarClient::new(" ", Duration::from_secs(5)).unwrap_err();
        assert_eq!(err.code(), CalendarErrorCode::Configuration);
        assert_eq!(err.client(), Some("google"));
    }

    #[test]
    fn status_mapping() {
        let err = status_error(StatusCode::TOO_MANY_REQUESTS, Some(30), "");
        assert_eq!(err.code(), CalendarErrorCode::Transient);
        assert!(err.message().contains("retry after 30 seconds"));

        let err = status_error(StatusCode::UNAUTHORIZED, None, "");
        assert_eq!(err.code(), CalendarErrorCode::Rejected);

        let err = status_error(StatusCode::FORBIDDEN, None, "");
        assert_eq!(err.code(), CalendarErrorCode::Rejected);

        let err = status_error(StatusCode::NOT_FOUND, None, "");
        assert_eq!(err.code(), CalendarErrorCode::Rejected);

        let err = status_error(StatusCode::BAD_REQUEST, None, "Invalid recurrence rule");
        assert_eq!(err.code(), CalendarErrorCode::Rejected);
        assert!(err.message().contains("Invalid recurrence rule"));

        let err = status_error(StatusCode::BAD_GATEWAY, None, "");
        assert_eq!(err.code(), CalendarErrorCode::Transient);
        assert!(err.is_retryable());

        let err = status_error(StatusCode::CONFLICT, None, "duplicate");
        assert!(!err.is_retryable());
    }

    #[test]
    fn parse_event_list_response() {
        let json = r#"{
            "kind": "calendar#events",
            "items": [
                {
                    "id": "event1",
                    "summary": "Line 1 - weekend closure",
                    "description": "https://ttc.ca/a",
                    "start": { "date": "2022-03-12" },
                    "end": { "date": "2022-03-14" }
                },
                {
                    "id": "event2",
                    "summary": "Lunch"
                },
                {
                    "summary": "no id"
                }
            ],
            "nextPageToken": "page-2"
        }"#;

        let response: EventListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.next_page_token.as_deref(), Some("page-2"));

        let events: Vec<ExistingEvent> = response
            .items
            .into_iter()
            .filter_map(ApiEvent::into_existing)
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].description.as_deref(), Some("https://ttc.ca/a"));
        assert!(events[1].description.is_none());
    }

    #[test]
    fn parse_empty_list_response() {
        let response: EventListResponse =
            serde_json::from_str(r#"{"kind": "calendar#events"}"#).unwrap();
        assert!(response.items.is_empty());
        assert!(response.next_page_token.is_none());
    }

    #[test]
    fn parse_created_event() {
        let json = r#"{
            "id": "abc123",
            "status": "confirmed",
            "htmlLink": "https://www.google.com/calendar/event?eid=abc123",
            "summary": "Line 1 - weekend closure"
        }"#;

        let created: ApiCreatedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(created.id, "abc123");
        assert!(created.html_link.unwrap().contains("eid=abc123"));
    }
}
