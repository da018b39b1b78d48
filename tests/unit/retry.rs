//! Unit tests for the retry backoff policy

use retail_traffic_extractor::sync::retry::{calculate_backoff, MAX_BACKOFF_MS};
use std::time::Duration;

#[test]
fn test_backoff_is_exponential() {
    let mut previous = Duration::ZERO;
    for attempt in 0..4 {
        let delay = calculate_backoff(attempt);
        assert!(delay > previous, "attempt {attempt} did not grow");
        previous = delay;
    }
}

#[test]
fn test_backoff_is_capped() {
    for attempt in [5, 6, 10, 31, u32::MAX] {
        assert_eq!(
            calculate_backoff(attempt),
            Duration::from_millis(MAX_BACKOFF_MS)
        );
    }
}
