//! Retry policy for transient fetch failures

use std::time::Duration;

/// Initial backoff delay in milliseconds.
/// 1 second is long enough for rate limit windows to reset but short enough
/// to not overly delay recovery from transient errors.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds.
/// 30 seconds caps exponential backoff so a long outage fails the run in
/// bounded time instead of stalling it.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Calculate the exponential backoff delay before retry `retry_count`.
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS.saturating_mul(2u64.saturating_pow(retry_count));
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}
