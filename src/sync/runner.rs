//! Incremental and full-table extraction runners
//!
//! The incremental runner is a small state machine: load the watermark,
//! capture the end boundary once, then alternate plan/fetch/commit until the
//! planner runs dry. The commit order inside each window is fixed: emit
//! records, flush the sink, persist the watermark. Nothing about a window is
//! observable downstream until all of it is.

use crate::config::ExtractorConfig;
use crate::fetcher::{FetchError, RecordFetcher};
use crate::output::RecordSink;
use crate::shutdown::SharedShutdown;
use crate::state::CheckpointStore;
use crate::streams::StreamSpec;
use crate::sync::retry::calculate_backoff;
use crate::sync::SyncError;
use crate::window::{plan_next, PlannedWindow};
use crate::{format_timestamp, Record};
use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

/// Outcome of syncing one stream.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Stream that was synced.
    pub stream: String,
    /// Windows fetched and committed.
    pub windows_committed: u64,
    /// Records emitted to the sink.
    pub records_emitted: u64,
    /// Whether a shutdown request stopped the run early. The committed
    /// watermark is still valid; the next run picks up where this one left
    /// off.
    pub interrupted: bool,
    /// Watermark after the run, for incremental streams.
    pub final_watermark: Option<NaiveDateTime>,
}

impl SyncReport {
    fn new(stream: &StreamSpec) -> Self {
        Self {
            stream: stream.name.to_string(),
            windows_committed: 0,
            records_emitted: 0,
            interrupted: false,
            final_watermark: None,
        }
    }
}

/// Drives stream extraction against a fetcher, store, and sink.
pub struct SyncRunner {
    config: ExtractorConfig,
    shutdown: Option<SharedShutdown>,
}

impl SyncRunner {
    /// Create a runner for the given configuration.
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            config: config.clone(),
            shutdown: None,
        }
    }

    /// Attach a shutdown handle, honored only between windows.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Run incremental extraction for one stream.
    ///
    /// Resumes from the stored watermark, or the configured start date when
    /// none is stored. The end boundary is captured once up front, so the
    /// loop terminates even when extraction is slower than wall-clock time.
    pub async fn run_incremental(
        &self,
        stream: &StreamSpec,
        fetcher: &dyn RecordFetcher,
        store: &mut CheckpointStore,
        sink: &mut dyn RecordSink,
    ) -> Result<SyncReport, SyncError> {
        let stored = store
            .watermark(stream.name)
            .map_err(|source| SyncError::State {
                stream: stream.name.to_string(),
                source,
            })?;

        let mut watermark = stored.unwrap_or(self.config.start_date);

        // Lookback re-covers the tail of already-committed history for
        // late-arriving data, clamped so it never precedes the configured
        // start.
        let lookback = self.config.lookback();
        if stored.is_some() && lookback > chrono::TimeDelta::zero() {
            watermark = (watermark - lookback).max(self.config.start_date);
        }

        let end_boundary = self
            .config
            .end_date
            .unwrap_or_else(|| chrono::Utc::now().naive_utc());
        let interval = self.config.interval();

        info!(
            stream = stream.name,
            watermark = %format_timestamp(watermark),
            end_boundary = %format_timestamp(end_boundary),
            interval_days = self.config.backfill_interval_days,
            resumed = stored.is_some(),
            "starting incremental sync"
        );

        let mut report = SyncReport::new(stream);
        report.final_watermark = Some(watermark);

        while let Some(planned) = plan_next(
            watermark,
            end_boundary,
            interval,
            self.config.granularity_cutover,
        ) {
            // The only cancellation point: between windows, where state is
            // consistent and resumable.
            if self.shutdown_requested() {
                warn!(stream = stream.name, "shutdown requested, stopping sync");
                report.interrupted = true;
                break;
            }

            let records = self.fetch_window_with_retry(fetcher, stream, &planned).await?;

            self.emit_batch(stream, &records, sink)?;

            // Commit: persist first, then advance the loop's watermark.
            store
                .advance(stream.name, planned.window.to)
                .map_err(|source| SyncError::Checkpoint {
                    stream: stream.name.to_string(),
                    window: planned.window,
                    source,
                })?;
            watermark = planned.window.to;

            report.windows_committed += 1;
            report.records_emitted += records.len() as u64;
            report.final_watermark = Some(watermark);

            metrics::counter!("extractor_windows_committed_total").increment(1);
            info!(
                stream = stream.name,
                window = %planned.window,
                granularity = %planned.granularity,
                records = records.len(),
                "window committed"
            );
        }

        info!(
            stream = stream.name,
            windows = report.windows_committed,
            records = report.records_emitted,
            interrupted = report.interrupted,
            "incremental sync finished"
        );
        Ok(report)
    }

    /// Run full-table extraction for one stream: a single request, no
    /// window, no checkpoint read or write.
    pub async fn run_full_table(
        &self,
        stream: &StreamSpec,
        fetcher: &dyn RecordFetcher,
        sink: &mut dyn RecordSink,
    ) -> Result<SyncReport, SyncError> {
        info!(stream = stream.name, "starting full-table sync");

        let mut attempt = 0u32;
        let records = loop {
            match fetcher.fetch_all(stream).await {
                Ok(records) => break records,
                Err(source) => {
                    attempt = match self.next_attempt(stream, None, attempt, source).await {
                        Ok(next) => next,
                        Err(source) => {
                            return Err(SyncError::FetchAll {
                                stream: stream.name.to_string(),
                                source,
                            })
                        }
                    }
                }
            }
        };

        let mut report = SyncReport::new(stream);
        self.emit_batch(stream, &records, sink)?;
        report.records_emitted = records.len() as u64;

        info!(
            stream = stream.name,
            records = report.records_emitted,
            "full-table sync finished"
        );
        Ok(report)
    }

    async fn fetch_window_with_retry(
        &self,
        fetcher: &dyn RecordFetcher,
        stream: &StreamSpec,
        planned: &PlannedWindow,
    ) -> Result<Vec<Record>, SyncError> {
        let mut attempt = 0u32;
        loop {
            match fetcher
                .fetch_window(stream, &planned.window, planned.granularity)
                .await
            {
                Ok(records) => return Ok(records),
                Err(source) => {
                    attempt = match self
                        .next_attempt(stream, Some(&planned.window), attempt, source)
                        .await
                    {
                        Ok(next) => next,
                        Err(source) => {
                            return Err(SyncError::Fetch {
                                stream: stream.name.to_string(),
                                window: planned.window,
                                source,
                            })
                        }
                    }
                }
            }
        }
    }

    /// Decide whether a failed fetch gets another attempt. Sleeps out the
    /// backoff and returns the next attempt number, or returns the error
    /// when the failure is fatal or the budget is spent.
    async fn next_attempt(
        &self,
        stream: &StreamSpec,
        window: Option<&crate::Window>,
        attempt: u32,
        error: FetchError,
    ) -> Result<u32, FetchError> {
        if !error.is_transient() || attempt >= self.config.max_retries {
            return Err(error);
        }

        let backoff = calculate_backoff(attempt);
        metrics::counter!("extractor_fetch_retries_total").increment(1);
        warn!(
            stream = stream.name,
            window = window.map(|w| w.to_string()).unwrap_or_default(),
            attempt = attempt + 1,
            max_retries = self.config.max_retries,
            backoff_ms = backoff.as_millis() as u64,
            error = %error,
            "transient fetch failure, retrying"
        );
        tokio::time::sleep(backoff).await;
        Ok(attempt + 1)
    }

    fn emit_batch(
        &self,
        stream: &StreamSpec,
        records: &[Record],
        sink: &mut dyn RecordSink,
    ) -> Result<(), SyncError> {
        for record in records {
            sink.emit(record).map_err(|source| SyncError::Output {
                stream: stream.name.to_string(),
                source,
            })?;
        }
        sink.flush().map_err(|source| SyncError::Output {
            stream: stream.name.to_string(),
            source,
        })?;
        metrics::counter!("extractor_records_emitted_total").increment(records.len() as u64);
        debug!(stream = stream.name, records = records.len(), "batch emitted");
        Ok(())
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_requested())
            .unwrap_or(false)
    }
}
