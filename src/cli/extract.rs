//! Extract command implementation

use crate::cli::CliError;
use crate::config::ExtractorConfig;
use crate::fetcher::ProdcoFetcher;
use crate::output::JsonlWriter;
use crate::shutdown::SharedShutdown;
use crate::state::CheckpointStore;
use crate::streams::{self, Replication, StreamSpec};
use crate::sync::{SyncReport, SyncRunner};
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

/// Extract retail traffic data from the Prodco API
#[derive(Debug, Parser)]
#[command(name = "retail-traffic-extractor", version, about)]
pub struct Cli {
    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9090)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run extraction for the configured streams
    Extract(ExtractArgs),
    /// List the stream catalog
    Streams(crate::cli::StreamsCommand),
    /// Validate a configuration file and exit
    Check(crate::cli::CheckCommand),
}

/// Arguments for the extract command
#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Path to the checkpoint state file
    #[arg(long, default_value = "state.json")]
    pub state: PathBuf,

    /// Directory for JSONL output files, one per stream
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Sync only the named streams (may be repeated); default is all
    #[arg(long = "stream")]
    pub streams: Vec<String>,
}

impl ExtractArgs {
    /// Execute extraction for every selected stream, sequentially.
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<(), CliError> {
        let config = ExtractorConfig::from_file(&self.config)?;
        let selected = self.select_streams()?;

        let fetcher = ProdcoFetcher::new(&config)?;
        let mut store = CheckpointStore::open(&self.state)?;
        let runner = SyncRunner::new(&config).with_shutdown(shutdown.clone());

        let mut reports = Vec::new();
        for stream in &selected {
            if shutdown.is_requested() {
                warn!(stream = stream.name, "shutdown requested, skipping stream");
                break;
            }

            let path = self.output.join(format!("{}.jsonl", stream.name));
            let mut sink = JsonlWriter::create(&path)?;

            let report = match stream.replication {
                Replication::Incremental { .. } => {
                    runner
                        .run_incremental(stream, &fetcher, &mut store, &mut sink)
                        .await?
                }
                Replication::FullTable => {
                    runner.run_full_table(stream, &fetcher, &mut sink).await?
                }
            };

            sink.close()?;
            reports.push(report);
        }

        summarize(&reports);
        Ok(())
    }

    fn select_streams(&self) -> Result<Vec<&'static StreamSpec>, CliError> {
        if self.streams.is_empty() {
            return Ok(streams::catalog().iter().collect());
        }

        self.streams
            .iter()
            .map(|name| {
                streams::find(name).ok_or_else(|| {
                    let known: Vec<_> = streams::catalog().iter().map(|s| s.name).collect();
                    CliError::InvalidArgument(format!(
                        "unknown stream '{name}'; known streams: {}",
                        known.join(", ")
                    ))
                })
            })
            .collect()
    }
}

fn summarize(reports: &[SyncReport]) {
    for report in reports {
        info!(
            stream = %report.stream,
            windows = report.windows_committed,
            records = report.records_emitted,
            interrupted = report.interrupted,
            "stream summary"
        );
    }
    let total: u64 = reports.iter().map(|r| r.records_emitted).sum();
    let interrupted = reports.iter().any(|r| r.interrupted);
    if interrupted {
        warn!(total_records = total, "extraction interrupted; rerun to resume");
    } else {
        info!(total_records = total, "extraction complete");
    }
}
