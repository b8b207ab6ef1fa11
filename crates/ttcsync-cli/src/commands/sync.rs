//! Pipeline commands: `advisories` and `sync`.

use tracing::{debug, info};
use ttcsync_advisories::{
    AdvisoryFetcher, AdvisorySource, CannedAdvisorySource, EventExtractor, ExtractionReport,
    HttpAdvisorySource, run_advisory_stage,
};
use ttcsync_calendar::{
    CalendarClient, CalendarSync, GoogleCalendarClient, MemoryCalendar, SyncReport,
};
use ttcsync_core::Event;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Runs the advisory stage against the live site, or the bundled snapshot
/// when `offline` is set.
pub async fn fetch_events(config: &ClientConfig, offline: bool) -> ClientResult<ExtractionReport> {
    let extractor = EventExtractor::new(config.source.markup());

    if offline {
        info!("offline: using bundled advisory snapshot");
        extract_with(CannedAdvisorySource::default(), &extractor).await
    } else {
        let source = HttpAdvisorySource::new(config.source.to_source_config())?;
        extract_with(source, &extractor).await
    }
}

async fn extract_with<S: AdvisorySource>(
    source: S,
    extractor: &EventExtractor,
) -> ClientResult<ExtractionReport> {
    let fetcher = AdvisoryFetcher::new(source);
    Ok(run_advisory_stage(&fetcher, extractor).await?)
}

/// Prints the extracted events as a JSON array.
pub async fn advisories(config: &ClientConfig, offline: bool) -> ClientResult<()> {
    let report = fetch_events(config, offline).await?;
    let json = serde_json::to_string_pretty(&report.events)
        .map_err(|e| ClientError::Output(format!("failed to serialize events: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Fetches advisories and inserts the missing events.
///
/// Offline runs write into an in-memory calendar, so they exercise the
/// whole pipeline without credentials.
pub async fn sync(config: &ClientConfig, offline: bool) -> ClientResult<SyncReport> {
    config.validate().map_err(ClientError::Config)?;

    let extraction = fetch_events(config, offline).await?;
    let sync_config = config.calendar.to_sync_config(config.dry_run);

    let report = if offline {
        sync_with(MemoryCalendar::new(), sync_config, &extraction.events).await?
    } else {
        let token = config
            .calendar
            .resolve_access_token()
            .map_err(ClientError::Config)?;
        let client = GoogleCalendarClient::new(token, config.calendar.timeout())?;
        sync_with(client, sync_config, &extraction.events).await?
    };

    print_report(&extraction, &report)?;
    Ok(report)
}

async fn sync_with<C: CalendarClient>(
    client: C,
    config: ttcsync_calendar::SyncConfig,
    events: &[Event],
) -> ClientResult<SyncReport> {
    debug!("syncing {} events with {} client", events.len(), client.name());
    let sync = CalendarSync::new(client, config);
    Ok(sync.sync(events).await?)
}

fn print_report(extraction: &ExtractionReport, report: &SyncReport) -> ClientResult<()> {
    for created in &report.inserted {
        println!(
            "added: {}{}",
            created.summary.as_deref().unwrap_or(&created.id),
            created
                .html_link
                .as_deref()
                .map(|link| format!(" ({})", link))
                .unwrap_or_default()
        );
    }

    for payload in &report.dry_run_payloads {
        let json = serde_json::to_string_pretty(payload)
            .map_err(|e| ClientError::Output(format!("failed to serialize payload: {}", e)))?;
        println!("would insert:\n{}", json);
    }

    for failed in report.rejected.iter().chain(&report.failed) {
        eprintln!("not synced: {}: {}", failed.uri, failed.error);
    }

    println!(
        "{} advisories ({} skipped), {} inserted, {} already present, {} rejected, {} failed",
        extraction.events.len() + extraction.skipped_count(),
        extraction.skipped_count(),
        report.inserted.len(),
        report.already_present.len(),
        report.rejected.len(),
        report.failed.len()
    );
    Ok(())
}
