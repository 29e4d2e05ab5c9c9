// crates/resilience/src/retry.rs
//! Retrying log store calls with doubling pauses

use crate::error::ResilienceError;
use std::future::Future;
use std::time::Duration;

/// How many times to call, and how long to pause between failed calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: usize,
    first_delay: Duration,
    ceiling: Duration,
}

impl RetryPolicy {
    /// `attempts` counts the first call; pauses start at 100ms and stop
    /// growing at 5s
    pub fn new(attempts: usize) -> Self {
        Self {
            attempts,
            first_delay: Duration::from_millis(100),
            ceiling: Duration::from_secs(5),
        }
    }

    pub fn first_delay(mut self, delay: Duration) -> Self {
        self.first_delay = delay;
        self
    }

    pub fn ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling;
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Pause after the `failed`-th failure: the first delay, doubled for
    /// every earlier failure, never above the ceiling
    pub fn pause_after(&self, failed: usize) -> Duration {
        let doublings = failed.saturating_sub(1).min(31) as u32;
        self.first_delay
            .saturating_mul(1 << doublings)
            .min(self.ceiling)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Calls `operation` until it succeeds or fails with an error
/// `is_retryable` refuses, at most `policy.attempts()` times
pub async fn with_retry<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> Result<T, ResilienceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut last_error = String::from("no attempt was made");

    for attempt in 1..=policy.attempts() {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };
        if !is_retryable(&error) {
            return Err(ResilienceError::Permanent {
                attempt,
                error: error.to_string(),
            });
        }
        last_error = error.to_string();

        if attempt < policy.attempts() {
            let pause = policy.pause_after(attempt);
            log::warn!(
                "Log store call failed ({}/{}): {}; next try in {:?}",
                attempt,
                policy.attempts(),
                last_error,
                pause
            );
            tokio::time::sleep(pause).await;
        }
    }

    Err(ResilienceError::RetriesExhausted {
        attempts: policy.attempts(),
        last_error,
    })
}
