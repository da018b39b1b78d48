//! Authenticated, rate-limited record fetching
//!
//! The [`RecordFetcher`] trait is the seam between the sync loop and the
//! remote API: one call per window (or per full-table pull), a batch of
//! opaque records back, and a typed error taxonomy that tells the loop
//! whether retrying can help.

use crate::streams::StreamSpec;
use crate::sync::rate_limit::RequestPacer;
use crate::{config::ExtractorConfig, format_timestamp, Granularity, Record, Window};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub mod auth;
pub mod envelope;
pub mod http;

pub use auth::{Authenticator, Credentials};
pub use http::ApiClient;

/// Fetch errors, split into transient and fatal conditions.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure (timeout, connection refused, DNS)
    #[error("network error: {0}")]
    Network(String),

    /// Remote server error
    #[error("server error: HTTP {status}")]
    Server {
        /// HTTP status code
        status: u16,
    },

    /// Remote rate limit tripped
    #[error("rate limit exceeded")]
    RateLimited,

    /// Client error; the request itself is wrong and retrying cannot help
    #[error("client error: HTTP {status}: {body}")]
    Client {
        /// HTTP status code
        status: u16,
        /// Response body excerpt
        body: String,
    },

    /// Token acquisition failed
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Response envelope did not have the expected shape
    #[error("malformed response envelope: {0}")]
    Envelope(String),

    /// Response body was not parseable JSON
    #[error("parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// Whether the sync loop may retry this failure.
    ///
    /// Network faults, 5xx, and 429 are transient; everything else aborts
    /// the stream.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_) | FetchError::Server { .. } | FetchError::RateLimited
        )
    }
}

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Source of record batches for the sync loop.
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    /// Fetch one window of an incremental stream.
    async fn fetch_window(
        &self,
        stream: &StreamSpec,
        window: &Window,
        granularity: Granularity,
    ) -> FetchResult<Vec<Record>>;

    /// Fetch a full-table stream in a single request.
    async fn fetch_all(&self, stream: &StreamSpec) -> FetchResult<Vec<Record>>;
}

/// Production fetcher against the Prodco API.
pub struct ProdcoFetcher {
    api: ApiClient,
    auth: Authenticator,
    pacer: Arc<RequestPacer>,
}

impl ProdcoFetcher {
    /// Build a fetcher from validated configuration.
    pub fn new(config: &ExtractorConfig) -> FetchResult<Self> {
        let client = http::build_http_client()?;
        let auth = Authenticator::new(
            client.clone(),
            config.auth_url.clone(),
            Credentials {
                username: config.username.clone(),
                password: config.password.clone(),
            },
        );
        let api = ApiClient::new(client, config.api_base_url.clone());
        let pacer = Arc::new(RequestPacer::from_millis(config.request_delay_ms));
        Ok(Self { api, auth, pacer })
    }

    /// Replace the request pacer, sharing it with other fetchers if needed.
    pub fn with_pacer(mut self, pacer: Arc<RequestPacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Explicitly owned authenticator for this fetcher.
    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    async fn get_records(
        &self,
        stream: &StreamSpec,
        params: &[(&str, String)],
    ) -> FetchResult<Vec<Record>> {
        // Pace first: the minimum delay runs from the previous response to
        // the next request, independent of what happened in between.
        self.pacer.pace().await;
        let bearer = self.auth.bearer_token().await?;
        let result = self.api.get_json(stream.path, params, &bearer).await;
        self.pacer.record_return().await;

        envelope::extract_records(result?)
    }
}

#[async_trait]
impl RecordFetcher for ProdcoFetcher {
    async fn fetch_window(
        &self,
        stream: &StreamSpec,
        window: &Window,
        granularity: Granularity,
    ) -> FetchResult<Vec<Record>> {
        let params = [
            ("from", format_timestamp(window.from)),
            ("to", format_timestamp(window.to)),
            ("increment", granularity.as_str().to_string()),
        ];
        debug!(stream = stream.name, %window, %granularity, "fetching window");
        self.get_records(stream, &params).await
    }

    async fn fetch_all(&self, stream: &StreamSpec) -> FetchResult<Vec<Record>> {
        debug!(stream = stream.name, "fetching full table");
        self.get_records(stream, &[]).await
    }
}
