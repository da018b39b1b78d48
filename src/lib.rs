//! # Retail Traffic Extractor Library
//!
//! A library for extracting retail store traffic data from the Prodco API
//! as a resumable, replicated stream of JSON records. Designed for periodic
//! backfill and incremental sync into downstream analytics pipelines.
//!
//! ## Features
//!
//! - **Incremental Extraction**: Date-windowed sync with a durable per-stream
//!   watermark, so interrupted runs resume without losing data
//! - **Full-Table Extraction**: Single-request mode for small dimension
//!   streams without a replication key
//! - **Rate Limiting**: Minimum inter-request delay to respect API limits
//! - **At-Least-Once Delivery**: Records are emitted before the watermark is
//!   committed; a crash re-fetches a window, never skips one
//! - **Granularity Cutover**: Request aggregation resolution selected per
//!   window from a configured cutover date
//!
//! ## Architecture
//!
//! The library is organized into several core modules:
//!
//! - [`config`] - Extraction configuration loading and validation
//! - [`streams`] - Catalog of extractable API streams
//! - [`window`] - Window planning for incremental extraction
//! - [`fetcher`] - Authenticated, rate-limited HTTP record fetching
//! - [`sync`] - Extraction orchestration with retry and checkpointing
//! - [`state`] - Durable checkpoint store for stream watermarks
//! - [`output`] - Record sinks (JSON lines)
//!
//! ## Quick Start
//!
//! ```no_run
//! use retail_traffic_extractor::config::ExtractorConfig;
//! use retail_traffic_extractor::fetcher::ProdcoFetcher;
//! use retail_traffic_extractor::output::JsonlWriter;
//! use retail_traffic_extractor::state::CheckpointStore;
//! use retail_traffic_extractor::streams;
//! use retail_traffic_extractor::sync::SyncRunner;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractorConfig::from_file("config.json".as_ref())?;
//! let fetcher = ProdcoFetcher::new(&config)?;
//! let mut store = CheckpointStore::open("state.json".as_ref())?;
//! let mut sink = JsonlWriter::create("out/traffic_data.jsonl".as_ref())?;
//!
//! let stream = streams::find("traffic_data").unwrap();
//! let runner = SyncRunner::new(&config);
//! let report = runner
//!     .run_incremental(stream, &fetcher, &mut store, &mut sink)
//!     .await?;
//! println!("committed {} windows", report.windows_committed);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// CLI command implementations
pub mod cli;

/// Extraction configuration
pub mod config;

/// Authenticated record fetching
pub mod fetcher;

/// Prometheus metrics bootstrap
pub mod metrics;

/// Record sinks
pub mod output;

/// Graceful shutdown coordination
pub mod shutdown;

/// Durable checkpoint state
pub mod state;

/// Stream catalog
pub mod streams;

/// Extraction orchestration
pub mod sync;

/// Window planning
pub mod window;

/// Timestamp format used for watermarks, state files, and query parameters.
///
/// The source API works in timezone-naive UTC; no offset suffix is ever
/// attached or accepted.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse a timezone-naive UTC timestamp.
///
/// Accepts the full `%Y-%m-%dT%H:%M:%S` form and, as a convenience for
/// configuration files, a bare `%Y-%m-%d` date (interpreted as midnight).
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, String> {
    let input = input.trim();

    if let Ok(ts) = NaiveDateTime::parse_from_str(input, TIMESTAMP_FORMAT) {
        return Ok(ts);
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return Ok(ts);
        }
    }

    Err(format!(
        "invalid timestamp '{input}': expected {TIMESTAMP_FORMAT} or YYYY-MM-DD"
    ))
}

/// Format a timestamp in the wire/state format.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// An opaque record returned by the API.
///
/// Records are passed through to the sink unmodified; the extractor only
/// peels the response envelope, it never reshapes payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub serde_json::Map<String, serde_json::Value>);

impl Record {
    /// Look up a field of the record by key.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A half-open time range `[from, to)` fetched by one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// Inclusive lower bound.
    pub from: NaiveDateTime,
    /// Exclusive upper bound.
    pub to: NaiveDateTime,
}

impl Window {
    /// Construct a window. Returns `None` unless `from < to`.
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Option<Self> {
        if from < to {
            Some(Self { from, to })
        } else {
            None
        }
    }

    /// Width of the window.
    pub fn width(&self) -> TimeDelta {
        self.to - self.from
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            format_timestamp(self.from),
            format_timestamp(self.to)
        )
    }
}

/// Aggregation resolution requested from the API via the `increment`
/// query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    /// Fine-grained 15-minute buckets.
    #[serde(rename = "FIFTEEN_MINUTES")]
    FifteenMinutes,
    /// Coarse hourly buckets, used for history before the cutover date.
    #[serde(rename = "HOUR")]
    Hour,
}

impl Granularity {
    /// Select the granularity for a window.
    ///
    /// Coarse (hourly) strictly before the cutover date, fine at or after
    /// it. With no cutover configured every window is fine-grained. This is
    /// a pure function of the window start; committed windows are never
    /// re-evaluated.
    pub fn select(window_start: NaiveDateTime, cutover: Option<NaiveDateTime>) -> Self {
        match cutover {
            Some(cutover) if window_start < cutover => Granularity::Hour,
            _ => Granularity::FifteenMinutes,
        }
    }

    /// Wire value for the `increment` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::FifteenMinutes => "FIFTEEN_MINUTES",
            Granularity::Hour => "HOUR",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIFTEEN_MINUTES" => Ok(Granularity::FifteenMinutes),
            "HOUR" => Ok(Granularity::Hour),
            _ => Err(format!("invalid granularity: {s}")),
        }
    }
}
