//! Check command implementation

use crate::cli::CliError;
use crate::config::ExtractorConfig;
use crate::format_timestamp;
use clap::Args;
use std::path::PathBuf;

/// Validate a configuration file and exit
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Path to the JSON configuration file
    #[arg(short, long)]
    pub config: PathBuf,
}

impl CheckCommand {
    /// Load and validate the configuration, printing the effective policy.
    /// Credentials are checked for presence, never echoed.
    pub fn execute(&self) -> Result<(), CliError> {
        let config = ExtractorConfig::from_file(&self.config)?;

        println!("configuration OK");
        println!("  start_date:         {}", format_timestamp(config.start_date));
        println!(
            "  end_date:           {}",
            config
                .end_date
                .map(format_timestamp)
                .unwrap_or_else(|| "(wall clock at run start)".to_string())
        );
        println!("  backfill_interval:  {} days", config.backfill_interval_days);
        println!(
            "  granularity_cutover: {}",
            config
                .granularity_cutover
                .map(format_timestamp)
                .unwrap_or_else(|| "(none, always fine-grained)".to_string())
        );
        println!("  request_delay_ms:   {}", config.request_delay_ms);
        println!("  lookback_seconds:   {}", config.lookback_seconds);
        println!("  max_retries:        {}", config.max_retries);
        println!("  api_base_url:       {}", config.api_base_url);
        Ok(())
    }
}
