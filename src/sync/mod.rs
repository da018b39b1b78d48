//! Extraction orchestration
//!
//! This module drives the whole extraction workflow:
//!
//! 1. **Planning**: [`crate::window`] turns the watermark into bounded
//!    request windows
//! 2. **Fetching**: a [`crate::fetcher::RecordFetcher`] pulls each window,
//!    with bounded retry on transient failures
//! 3. **Committing**: records go to the sink first, the watermark is
//!    persisted second, so a crash re-fetches a window rather than skipping
//!    one
//! 4. **Pacing**: [`rate_limit::RequestPacer`] spaces requests out
//!
//! # Error Handling
//!
//! All operations return `Result<_, SyncError>` carrying the stream name
//! and, where one exists, the offending window. Transient fetch errors are
//! retried with exponential backoff up to the configured budget; fatal
//! errors abort the stream with the checkpoint left at the last committed
//! window.

use crate::fetcher::FetchError;
use crate::output::OutputError;
use crate::state::StateError;
use crate::Window;

pub mod rate_limit;
pub mod retry;
pub mod runner;

pub use rate_limit::RequestPacer;
pub use runner::{SyncReport, SyncRunner};

/// Sync errors, each carrying the stream they happened on.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A window fetch failed fatally or exhausted its retry budget
    #[error("stream {stream}: window {window}: {source}")]
    Fetch {
        /// Stream being synced
        stream: String,
        /// Window in flight
        window: Window,
        /// Underlying fetch failure
        #[source]
        source: FetchError,
    },

    /// A full-table fetch failed fatally or exhausted its retry budget
    #[error("stream {stream}: {source}")]
    FetchAll {
        /// Stream being synced
        stream: String,
        /// Underlying fetch failure
        #[source]
        source: FetchError,
    },

    /// Reading persisted state failed
    #[error("stream {stream}: {source}")]
    State {
        /// Stream being synced
        stream: String,
        /// Underlying state failure
        #[source]
        source: StateError,
    },

    /// Persisting the watermark failed; the in-memory watermark was not
    /// advanced
    #[error("stream {stream}: window {window}: checkpoint write failed: {source}")]
    Checkpoint {
        /// Stream being synced
        stream: String,
        /// Window whose commit failed
        window: Window,
        /// Underlying state failure
        #[source]
        source: StateError,
    },

    /// Emitting to the sink failed
    #[error("stream {stream}: output failed: {source}")]
    Output {
        /// Stream being synced
        stream: String,
        /// Underlying sink failure
        #[source]
        source: OutputError,
    },
}
