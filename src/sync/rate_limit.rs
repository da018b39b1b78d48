//! Request pacing
//!
//! The source API wants breathing room between calls, so the fetcher blocks
//! until a minimum delay has elapsed since the previous response arrived.
//! This is a scheduling discipline between successful requests; backoff
//! after failures is the retry policy's business, not the pacer's.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::trace;

/// Enforces a minimum delay between consecutive requests.
#[derive(Debug)]
pub struct RequestPacer {
    delay: Duration,
    last_return: Mutex<Option<Instant>>,
}

impl RequestPacer {
    /// Create a pacer with the given minimum inter-request delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_return: Mutex::new(None),
        }
    }

    /// Create a pacer from a delay in milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// The configured minimum delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Block until the minimum delay since the previous recorded return has
    /// elapsed. Returns immediately on the first call.
    pub async fn pace(&self) {
        let wait = {
            let last = self.last_return.lock().await;
            last.map(|prev| self.delay.saturating_sub(prev.elapsed()))
                .filter(|wait| !wait.is_zero())
        };

        if let Some(wait) = wait {
            trace!(wait_ms = wait.as_millis() as u64, "pacing request");
            sleep(wait).await;
        }
    }

    /// Record that a request just returned; the next [`pace`](Self::pace)
    /// measures its delay from this instant.
    pub async fn record_return(&self) {
        *self.last_return.lock().await = Some(Instant::now());
    }
}
