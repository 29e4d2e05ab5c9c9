// crates/resilience/src/timeout.rs
//! Bounding a whole store call, retries included

use crate::error::{ResilienceError, ResilienceResult};
use std::future::Future;
use std::time::Duration;

/// Deadline measured on the tokio timer from the moment `run` is awaited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    limit: Duration,
}

impl Timeout {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Drops `operation` unfinished once the limit passes
    pub async fn run<F, T>(&self, operation: F) -> ResilienceResult<T>
    where
        F: Future<Output = T>,
    {
        match tokio::time::timeout(self.limit, operation).await {
            Ok(value) => Ok(value),
            Err(_) => {
                log::warn!("Store call abandoned after {:?}", self.limit);
                Err(ResilienceError::Timeout(self.limit))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_call_within_limit_returns_value() {
        let timeout = Timeout::new(Duration::from_secs(1));
        let result = timeout
            .run(async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                42
            })
            .await;

        assert_eq!(result.ok(), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_is_cut_off() {
        let timeout = Timeout::new(Duration::from_millis(10));
        let result = timeout
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await;

        match result {
            Err(ResilienceError::Timeout(limit)) => assert_eq!(limit, timeout.limit()),
            other => panic!("expected a timeout, got {:?}", other),
        }
    }
}
