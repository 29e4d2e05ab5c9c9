// crates/resilience/src/error.rs
//! Why a guarded store call gave up

use std::time::Duration;
use thiserror::Error;

pub type ResilienceResult<T> = Result<T, ResilienceError>;

#[derive(Debug, Error)]
pub enum ResilienceError {
    #[error("No answer within {0:?}")]
    Timeout(Duration),

    /// Every attempt failed with a retryable error
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },

    /// An attempt failed with an error retrying cannot fix
    #[error("Attempt {attempt} failed and will not be retried: {error}")]
    Permanent { attempt: usize, error: String },
}

impl ResilienceError {
    /// Calls made before giving up; a timeout does not know
    pub fn attempts(&self) -> usize {
        match self {
            Self::Timeout(_) => 0,
            Self::RetriesExhausted { attempts, .. } => *attempts,
            Self::Permanent { attempt, .. } => *attempt,
        }
    }
}
