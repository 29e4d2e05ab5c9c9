//! Error types and recovery strategies for syncwatch
//!
//! Errors are grouped by how a caller should react to them:
//! - **Recoverable**: the log store was unreachable or slow, retry later
//! - **Degraded**: the request itself was bad (malformed root, bad argument)
//! - **Fatal**: the deployment is misconfigured or the log is damaged
//!
//! The change finder never retries on its own. A transient failure reaches the
//! caller untouched and the caller's cursor stays where it was.

use std::fmt;
use thiserror::Error;

/// Recovery actions a caller can take when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the same call right away (e.g., a single slow query)
    RetryImmediate,
    /// Retry with exponential backoff (e.g., store temporarily unreachable)
    RetryWithBackoff,
    /// Check and repair the backing database
    RepairDatabase,
    /// No automatic recovery, fix the request or the configuration
    UserIntervention,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetryImmediate => write!(f, "Retrying immediately"),
            Self::RetryWithBackoff => write!(f, "Retrying with backoff"),
            Self::RepairDatabase => write!(f, "Repairing database"),
            Self::UserIntervention => write!(f, "User intervention required"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error can be recovered from by retrying later
    Recoverable,
    /// This request failed but the service is healthy
    Degraded,
    /// Requires operator action before any call can succeed
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for syncwatch
#[derive(Error, Debug)]
pub enum SyncWatchError {
    // ===== Transient store errors =====
    /// The log store could not be reached or rejected the request
    #[error("Log store unavailable: {message}")]
    StoreUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The log store did not answer in time
    #[error("Log store timed out after {millis}ms: {operation}")]
    StoreTimeout { operation: String, millis: u64 },

    // ===== Configuration errors =====
    /// A synchronization root is not a normalized absolute path
    #[error("Invalid synchronization root '{path}': {reason}")]
    InvalidRootPath { path: String, reason: String },

    /// No repository is in scope for the request
    #[error("Repository scope is empty")]
    EmptyRepositoryScope,

    /// A configuration value is out of range or malformed
    #[error("Invalid configuration: {setting} = '{value}' ({reason})")]
    InvalidConfiguration {
        setting: String,
        value: String,
        reason: String,
    },

    /// The configured store backend does not exist
    #[error("Unknown store backend: {name}")]
    UnknownBackend { name: String },

    // ===== Data errors =====
    /// A stored log entry could not be decoded
    #[error("Corrupted log entry {id}: {reason}")]
    CorruptedEntry { id: i64, reason: String },

    /// Invalid argument provided
    #[error("Invalid argument: {argument} - {reason}")]
    InvalidArgument { argument: String, reason: String },
}

impl SyncWatchError {
    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::StoreUnavailable { .. } | Self::StoreTimeout { .. } => {
                ErrorSeverity::Recoverable
            }

            Self::InvalidRootPath { .. } | Self::InvalidArgument { .. } => {
                ErrorSeverity::Degraded
            }

            Self::EmptyRepositoryScope
            | Self::InvalidConfiguration { .. }
            | Self::UnknownBackend { .. }
            | Self::CorruptedEntry { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::StoreTimeout { .. } => RecoveryAction::RetryImmediate,
            Self::StoreUnavailable { .. } => RecoveryAction::RetryWithBackoff,
            Self::CorruptedEntry { .. } => RecoveryAction::RepairDatabase,
            _ => RecoveryAction::UserIntervention,
        }
    }

    /// Returns true if the failure came from the store and may go away on retry
    pub fn is_transient(&self) -> bool {
        self.severity() == ErrorSeverity::Recoverable
    }

    /// Returns true if the request or deployment is misconfigured
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidRootPath { .. }
                | Self::EmptyRepositoryScope
                | Self::InvalidConfiguration { .. }
                | Self::UnknownBackend { .. }
        )
    }

    /// Returns true if this error should be logged at ERROR level
    pub fn is_critical(&self) -> bool {
        self.severity() == ErrorSeverity::Fatal
    }

    /// Helper to create a store error from any error type
    pub fn store<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Helper to create an invalid root error
    pub fn invalid_root(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRootPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Helper to create an invalid argument error
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for Results using SyncWatchError
pub type Result<T> = std::result::Result<T, SyncWatchError>;
