//! JSON-lines sink
//!
//! One record per line, appended in arrival order. Replays after a resume
//! can duplicate a window's records (at-least-once delivery); downstream
//! consumers dedupe on the stream's primary keys.

use super::{OutputError, OutputResult, RecordSink};
use crate::Record;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Buffered JSON-lines file writer.
#[derive(Debug)]
pub struct JsonlWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    records_written: u64,
}

impl JsonlWriter {
    /// Create (or append to) a JSONL file, creating parent directories as
    /// needed. Appending keeps already-delivered records across resumed
    /// runs.
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| OutputError::Io(e.to_string()))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| OutputError::Io(format!("failed to open {}: {e}", path.display())))?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            records_written: 0,
        })
    }

    /// Records written by this writer instance.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and close the writer.
    pub fn close(mut self) -> OutputResult<()> {
        self.flush()?;
        info!(
            path = %self.path.display(),
            records = self.records_written,
            "output file closed"
        );
        Ok(())
    }
}

impl RecordSink for JsonlWriter {
    fn emit(&mut self, record: &Record) -> OutputResult<()> {
        serde_json::to_writer(&mut self.writer, record)
            .map_err(|e| OutputError::Serialization(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| OutputError::Io(e.to_string()))?;
        self.records_written += 1;
        Ok(())
    }

    fn flush(&mut self) -> OutputResult<()> {
        self.writer
            .flush()
            .map_err(|e| OutputError::Io(e.to_string()))
    }
}
