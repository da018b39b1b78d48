//! Token acquisition against the Prodco auth endpoint
//!
//! The authenticator is an explicitly owned, lazily-initialized credential
//! object: the first data request triggers a password-grant token exchange
//! and subsequent requests reuse the cached token until it nears expiry.
//! Callers needing a fresh token regardless of cache state use
//! [`Authenticator::refresh`].

use crate::fetcher::{FetchError, FetchResult};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Tokens are refreshed this long before their reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the token response omits `expires_in`.
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// API account credentials.
#[derive(Clone)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN < self.expires_at
    }
}

/// Password-grant authenticator with a cached bearer token.
pub struct Authenticator {
    http: reqwest::Client,
    auth_url: String,
    credentials: Credentials,
    cached: Mutex<Option<CachedToken>>,
}

impl Authenticator {
    /// Create an authenticator. No request is made until a token is needed.
    pub fn new(http: reqwest::Client, auth_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http,
            auth_url: auth_url.into(),
            credentials,
            cached: Mutex::new(None),
        }
    }

    /// A bearer token, acquiring one on first use or when the cached token
    /// is about to expire.
    pub async fn bearer_token(&self) -> FetchResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.is_fresh() {
                return Ok(token.token.clone());
            }
            debug!("cached token near expiry, re-acquiring");
        }

        let fresh = self.request_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    /// Discard any cached token and acquire a new one.
    pub async fn refresh(&self) -> FetchResult<String> {
        let mut cached = self.cached.lock().await;
        let fresh = self.request_token().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    async fn request_token(&self) -> FetchResult<CachedToken> {
        debug!(url = %self.auth_url, "requesting access token");

        let params = [
            ("resource", self.auth_url.as_str()),
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.as_str()),
            ("grant_type", "password"),
        ];

        let response = self
            .http
            .post(&self.auth_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "token endpoint rejected request");
            return Err(FetchError::Auth(format!(
                "token endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| FetchError::Auth(format!("malformed token response: {e}")))?;

        let lifetime = body
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        Ok(CachedToken {
            token: body.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}
