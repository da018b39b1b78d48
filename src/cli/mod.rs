//! CLI command implementations

pub mod catalog;
pub mod check;
pub mod error;
pub mod extract;

pub use catalog::StreamsCommand;
pub use check::CheckCommand;
pub use error::CliError;
pub use extract::{Cli, Commands, ExtractArgs};
