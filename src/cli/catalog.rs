//! Streams command implementation

use crate::cli::CliError;
use crate::streams::{self, Replication};
use clap::Args;

/// List the stream catalog
#[derive(Debug, Args)]
pub struct StreamsCommand {}

impl StreamsCommand {
    /// Print the catalog, one stream per line.
    pub fn execute(&self) -> Result<(), CliError> {
        println!("{:<16} {:<22} {:<14} PRIMARY KEYS", "STREAM", "PATH", "REPLICATION");
        for stream in streams::catalog() {
            let replication = match stream.replication {
                Replication::FullTable => "full-table".to_string(),
                Replication::Incremental { replication_key } => {
                    format!("incremental({replication_key})")
                }
            };
            println!(
                "{:<16} {:<22} {:<14} {}",
                stream.name,
                stream.path,
                replication,
                stream.primary_keys.join(", ")
            );
        }
        Ok(())
    }
}
