//! HTTP transport for the Prodco API
//!
//! One GET per call, bearer auth, and a typed split of failures into
//! transient (retryable by the sync loop) and fatal. No retry logic lives
//! here; pacing and retry are scheduling concerns owned by the caller.

use crate::fetcher::{FetchError, FetchResult};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Time allowed to establish a TCP connection.
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Overall time allowed for one request.
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Longest error-body excerpt attached to a client error.
const ERROR_BODY_LIMIT: usize = 256;

/// Build the shared HTTP client with explicit timeouts so a stalled server
/// cannot hang the extraction loop indefinitely.
pub fn build_http_client() -> FetchResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))
}

/// Thin JSON-over-HTTP client for the API root.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// The API root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue one GET and return the parsed JSON body.
    ///
    /// Status mapping: 429 and 5xx are transient, other 4xx are fatal,
    /// transport failures are transient, an unparseable 2xx body is fatal.
    pub async fn get_json(
        &self,
        path: &str,
        params: &[(&str, String)],
        bearer: &str,
    ) -> FetchResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, params = params.len(), "GET");

        metrics::counter!("extractor_http_requests_total").increment(1);

        let response = self
            .client
            .get(&url)
            .query(params)
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();

        if status.as_u16() == 429 {
            warn!(%url, "rate limit exceeded (429)");
            return Err(FetchError::RateLimited);
        }

        if status.is_server_error() {
            warn!(%url, status = status.as_u16(), "server error");
            return Err(FetchError::Server {
                status: status.as_u16(),
            });
        }

        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            // Char-wise so a multi-byte body cannot split mid-character.
            let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(FetchError::Client {
                status: status.as_u16(),
                body: excerpt,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Parse(format!("failed to parse response body: {e}")))
    }
}
