//! File-backed checkpoint store
//!
//! One JSON document per extractor run directory, holding a watermark per
//! stream. Writes are atomic (temp file + rename + fsync) and guarded by an
//! advisory lock, enforcing the single-writer discipline the incremental
//! loop relies on.
//!
//! The commit contract: [`CheckpointStore::advance`] persists the candidate
//! document first and only then updates the in-memory map. A failed write
//! leaves memory untouched, so the loop never believes in progress the disk
//! does not have.

use crate::{format_timestamp, parse_timestamp};
use chrono::NaiveDateTime;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Current state file schema version.
const SCHEMA_VERSION: &str = "1.0.0";

/// Maximum allowed state file size, to reject obviously corrupt files.
const MAX_STATE_FILE_SIZE: u64 = 1024 * 1024;

/// Errors from checkpoint persistence.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Schema version mismatch
    #[error("state schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch {
        /// Version this build writes
        expected: String,
        /// Version found on disk
        found: String,
    },

    /// State file too large to be plausible
    #[error("state file too large: {size} bytes (max {max})")]
    StateTooLarge {
        /// Actual size
        size: u64,
        /// Allowed maximum
        max: u64,
    },

    /// Stored watermark did not parse as a timestamp
    #[error("corrupt watermark for stream {stream}: {reason}")]
    CorruptWatermark {
        /// Stream whose entry is bad
        stream: String,
        /// Parse failure detail
        reason: String,
    },

    /// IO failure
    #[error("state IO error: {0}")]
    Io(String),

    /// Serialization failure
    #[error("state serialization error: {0}")]
    Serialization(String),

    /// Deserialization failure
    #[error("state deserialization error: {0}")]
    Deserialization(String),

    /// File lock failure
    #[error("state lock error: {0}")]
    Lock(String),
}

/// On-disk document layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StateDoc {
    schema_version: String,
    /// Stream name to watermark, in the wire timestamp format.
    streams: BTreeMap<String, String>,
    updated_at: Option<String>,
}

impl StateDoc {
    fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            streams: BTreeMap::new(),
            updated_at: None,
        }
    }
}

/// Durable per-stream watermark store.
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    doc: StateDoc,
}

impl CheckpointStore {
    /// Open a store at `path`, loading existing state if present.
    pub fn open(path: &Path) -> Result<Self, StateError> {
        if !path.exists() {
            debug!(path = %path.display(), "no state file, starting fresh");
            return Ok(Self {
                path: path.to_path_buf(),
                doc: StateDoc::new(),
            });
        }

        // Hold a shared lock for the whole read.
        let lock_file = open_lock_file(path)?;
        let lock = RwLock::new(lock_file);
        let _guard = lock
            .read()
            .map_err(|e| StateError::Lock(format!("failed to acquire read lock: {e}")))?;

        let metadata = std::fs::metadata(path).map_err(|e| StateError::Io(e.to_string()))?;
        if metadata.len() > MAX_STATE_FILE_SIZE {
            return Err(StateError::StateTooLarge {
                size: metadata.len(),
                max: MAX_STATE_FILE_SIZE,
            });
        }

        let contents =
            std::fs::read_to_string(path).map_err(|e| StateError::Io(e.to_string()))?;
        let doc: StateDoc = serde_json::from_str(&contents).map_err(|e| {
            warn!(error = %e, "failed to deserialize state file");
            StateError::Deserialization(e.to_string())
        })?;

        if doc.schema_version != SCHEMA_VERSION {
            return Err(StateError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION.to_string(),
                found: doc.schema_version,
            });
        }

        info!(
            path = %path.display(),
            streams = doc.streams.len(),
            "loaded checkpoint state"
        );

        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// The committed watermark for a stream, if any.
    pub fn watermark(&self, stream: &str) -> Result<Option<NaiveDateTime>, StateError> {
        match self.doc.streams.get(stream) {
            None => Ok(None),
            Some(raw) => parse_timestamp(raw)
                .map(Some)
                .map_err(|reason| StateError::CorruptWatermark {
                    stream: stream.to_string(),
                    reason,
                }),
        }
    }

    /// Advance a stream's watermark and persist it.
    ///
    /// The new document is written to disk before the in-memory map is
    /// updated; on failure the store is unchanged and the caller must not
    /// treat the window as committed.
    pub fn advance(&mut self, stream: &str, watermark: NaiveDateTime) -> Result<(), StateError> {
        let mut candidate = self.doc.clone();
        candidate
            .streams
            .insert(stream.to_string(), format_timestamp(watermark));
        candidate.updated_at = Some(format_timestamp(chrono::Utc::now().naive_utc()));

        save_doc(&self.path, &candidate)?;
        self.doc = candidate;

        debug!(
            stream,
            watermark = %format_timestamp(watermark),
            "checkpoint committed"
        );
        Ok(())
    }

    /// Streams with a committed watermark.
    pub fn stream_names(&self) -> impl Iterator<Item = &str> {
        self.doc.streams.keys().map(String::as_str)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Write the document atomically: temp file in the target directory,
/// flush + fsync, rename over the target, fsync the directory.
fn save_doc(path: &Path, doc: &StateDoc) -> Result<(), StateError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| StateError::Io(e.to_string()))?;
        }
    }

    let json =
        serde_json::to_string_pretty(doc).map_err(|e| StateError::Serialization(e.to_string()))?;

    // Hold an exclusive lock across the temp-write-and-rename sequence.
    let lock_file = open_lock_file(path)?;
    let mut lock = RwLock::new(lock_file);
    let _guard = lock
        .write()
        .map_err(|e| StateError::Lock(format!("failed to acquire write lock: {e}")))?;

    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
        .map_err(|e| StateError::Io(format!("failed to create temp file: {e}")))?;

    temp_file
        .write_all(json.as_bytes())
        .map_err(|e| StateError::Io(format!("failed to write temp file: {e}")))?;
    temp_file
        .flush()
        .map_err(|e| StateError::Io(format!("failed to flush temp file: {e}")))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| StateError::Io(format!("failed to sync temp file: {e}")))?;

    temp_file
        .persist(path)
        .map_err(|e| StateError::Io(format!("failed to persist temp file: {e}")))?;

    if let Ok(dir) = std::fs::File::open(parent_dir) {
        let _ = dir.sync_all();
    }

    Ok(())
}

fn open_lock_file(path: &Path) -> Result<std::fs::File, StateError> {
    let lock_path = path.with_extension("lock");
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| StateError::Lock(format!("failed to open lock file: {e}")))
}
