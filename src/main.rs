//! Main entry point for the retail-traffic-extractor CLI

use clap::Parser;
use retail_traffic_extractor::cli::{Cli, Commands};
use retail_traffic_extractor::metrics;
use retail_traffic_extractor::shutdown::{self, ShutdownCoordinator};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("retail_traffic_extractor=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr {
        if let Err(e) = metrics::init_metrics(addr) {
            error!("Failed to initialize metrics: {}", e);
            std::process::exit(1);
        }
    }

    // The coordinator is created here and passed down explicitly; the sync
    // loop honors it only between windows.
    let shutdown = ShutdownCoordinator::shared();
    shutdown::listen_for_ctrl_c(shutdown.clone());

    let result = match cli.command {
        Commands::Extract(ref args) => args
            .execute(shutdown.clone())
            .await
            .map_err(|e| anyhow::anyhow!(e)),
        Commands::Streams(ref cmd) => cmd.execute().map_err(|e| anyhow::anyhow!(e)),
        Commands::Check(ref cmd) => cmd.execute().map_err(|e| anyhow::anyhow!(e)),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
}
