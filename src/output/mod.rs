//! Record sinks
//!
//! Emission through a sink is the point at which a record becomes visible
//! downstream; the sync loop always emits a window's records (and flushes)
//! before committing the watermark.

use crate::Record;

pub mod jsonl;

pub use jsonl::JsonlWriter;

/// Sink errors.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO failure
    #[error("IO error: {0}")]
    Io(String),

    /// Record could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for sink operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for extracted records.
pub trait RecordSink {
    /// Make one record visible downstream.
    fn emit(&mut self, record: &Record) -> OutputResult<()>;

    /// Flush buffered records to durable storage.
    fn flush(&mut self) -> OutputResult<()>;
}
