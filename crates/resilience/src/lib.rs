// crates/resilience/src/lib.rs
//! Guards for calls into the log store
//!
//! [`with_retry`] repeats a call while its error is one the caller marks as
//! retryable, pausing a little longer each time. [`Timeout`] bounds the whole
//! thing.
//!
//! ```rust
//! use syncwatch_resilience::{with_retry, RetryPolicy, Timeout};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let policy = RetryPolicy::new(3).first_delay(Duration::from_millis(1));
//! let timeout = Timeout::new(Duration::from_secs(1));
//!
//! let value = timeout
//!     .run(with_retry(&policy, |_: &&str| true, || async { Ok::<_, &str>(42) }))
//!     .await
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(value, 42);
//! # }
//! ```

mod error;
mod retry;
mod timeout;

pub use error::{ResilienceError, ResilienceResult};
pub use retry::{with_retry, RetryPolicy};
pub use timeout::Timeout;
