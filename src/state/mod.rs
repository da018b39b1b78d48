//! Durable checkpoint state for stream watermarks
//!
//! Provides persistent watermark storage with atomic writes and advisory
//! file locking so only one extractor writes a state file at a time.

pub mod store;

pub use store::{CheckpointStore, StateError};
