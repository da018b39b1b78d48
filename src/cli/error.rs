//! CLI error types and conversions

use crate::config::ConfigError;
use crate::fetcher::FetchError;
use crate::output::OutputError;
use crate::state::StateError;
use crate::sync::SyncError;

/// CLI errors.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Sync error
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// State error
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// Fetch error
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Output error
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
