//! Extraction configuration loading and validation
//!
//! Configuration is a JSON file supplying API credentials and the backfill
//! policy. It is parsed and validated up front; nothing fetches until the
//! whole file is known to be sound.

use crate::parse_timestamp;
use chrono::{NaiveDateTime, TimeDelta};
use serde::Deserialize;
use std::path::Path;

/// Default minimum delay between requests, in milliseconds.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 250;

/// Default number of retries for transient fetch failures.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default backfill window width in days.
pub const DEFAULT_BACKFILL_INTERVAL_DAYS: f64 = 1.0;

/// Production API root.
pub const DEFAULT_API_BASE_URL: &str = "https://api.prodcotech.com/api";

/// Production token endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://api.prodcotech.com/token";

/// Configuration errors. All are fatal and surface before extraction starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {reason}")]
    Io {
        /// Offending path
        path: String,
        /// Underlying IO failure
        reason: String,
    },

    /// Config file is not valid JSON
    #[error("failed to parse config file: {0}")]
    Parse(String),

    /// A required setting is missing or empty
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// A setting has an invalid value
    #[error("invalid value for {setting}: {reason}")]
    Invalid {
        /// Setting name
        setting: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Raw config file shape. Timestamps stay strings here; [`ExtractorConfig`]
/// holds the parsed form.
#[derive(Debug, Deserialize)]
struct RawConfig {
    username: Option<String>,
    password: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    backfill_interval: Option<f64>,
    granularity_cutover: Option<String>,
    request_delay_ms: Option<u64>,
    lookback_seconds: Option<u64>,
    max_retries: Option<u32>,
    api_base_url: Option<String>,
    auth_url: Option<String>,
}

/// Validated extraction configuration, immutable for the process lifetime.
#[derive(Clone)]
pub struct ExtractorConfig {
    /// API account name
    pub username: String,
    /// API account password
    pub password: String,
    /// Earliest record date to sync
    pub start_date: NaiveDateTime,
    /// Optional fixed end of the sync range; defaults to wall-clock time
    /// captured once at loop start
    pub end_date: Option<NaiveDateTime>,
    /// Window width in days; fractional values allowed
    pub backfill_interval_days: f64,
    /// Windows starting before this date are requested at hourly granularity
    pub granularity_cutover: Option<NaiveDateTime>,
    /// Minimum delay between requests, in milliseconds
    pub request_delay_ms: u64,
    /// How far the watermark is moved back at loop start to cover
    /// late-arriving data
    pub lookback_seconds: u64,
    /// Retry budget for transient fetch failures
    pub max_retries: u32,
    /// API root, overridable for tests
    pub api_base_url: String,
    /// Token endpoint, overridable for tests
    pub auth_url: String,
}

impl std::fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("start_date", &self.start_date)
            .field("end_date", &self.end_date)
            .field("backfill_interval_days", &self.backfill_interval_days)
            .field("granularity_cutover", &self.granularity_cutover)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("lookback_seconds", &self.lookback_seconds)
            .field("max_retries", &self.max_retries)
            .field("api_base_url", &self.api_base_url)
            .field("auth_url", &self.auth_url)
            .finish()
    }
}

impl ExtractorConfig {
    /// Load and validate configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&contents)
    }

    /// Parse and validate configuration from a JSON string.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            serde_json::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let username = require_nonempty(raw.username, "username")?;
        let password = require_nonempty(raw.password, "password")?;

        let start_date = raw
            .start_date
            .ok_or(ConfigError::Missing("start_date"))
            .and_then(|s| parse_setting_timestamp(&s, "start_date"))?;

        let end_date = raw
            .end_date
            .map(|s| parse_setting_timestamp(&s, "end_date"))
            .transpose()?;

        if let Some(end) = end_date {
            if end <= start_date {
                return Err(ConfigError::Invalid {
                    setting: "end_date",
                    reason: format!(
                        "must be after start_date ({})",
                        crate::format_timestamp(start_date)
                    ),
                });
            }
        }

        let backfill_interval_days = raw
            .backfill_interval
            .unwrap_or(DEFAULT_BACKFILL_INTERVAL_DAYS);
        if !backfill_interval_days.is_finite() || backfill_interval_days <= 0.0 {
            return Err(ConfigError::Invalid {
                setting: "backfill_interval",
                reason: format!("must be a positive number of days, got {backfill_interval_days}"),
            });
        }

        let granularity_cutover = raw
            .granularity_cutover
            .map(|s| parse_setting_timestamp(&s, "granularity_cutover"))
            .transpose()?;

        let config = Self {
            username,
            password,
            start_date,
            end_date,
            backfill_interval_days,
            granularity_cutover,
            request_delay_ms: raw.request_delay_ms.unwrap_or(DEFAULT_REQUEST_DELAY_MS),
            lookback_seconds: raw.lookback_seconds.unwrap_or(0),
            max_retries: raw.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            api_base_url: raw
                .api_base_url
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            auth_url: raw.auth_url.unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
        };

        // The interval must survive conversion to a concrete duration;
        // sub-millisecond windows cannot advance the watermark.
        if config.interval() <= TimeDelta::zero() {
            return Err(ConfigError::Invalid {
                setting: "backfill_interval",
                reason: "interval rounds to zero duration".to_string(),
            });
        }

        Ok(config)
    }

    /// The backfill interval as a concrete duration, at millisecond
    /// resolution.
    pub fn interval(&self) -> TimeDelta {
        TimeDelta::milliseconds((self.backfill_interval_days * 86_400_000.0) as i64)
    }

    /// The lookback offset as a concrete duration.
    pub fn lookback(&self) -> TimeDelta {
        TimeDelta::seconds(self.lookback_seconds as i64)
    }
}

fn require_nonempty(value: Option<String>, setting: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(ConfigError::Invalid {
            setting,
            reason: "must not be empty".to_string(),
        }),
        None => Err(ConfigError::Missing(setting)),
    }
}

fn parse_setting_timestamp(
    value: &str,
    setting: &'static str,
) -> Result<NaiveDateTime, ConfigError> {
    parse_timestamp(value).map_err(|reason| ConfigError::Invalid { setting, reason })
}
