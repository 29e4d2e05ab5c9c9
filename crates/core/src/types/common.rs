//! Common types shared across the change finder

use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest log id considered durably committed as of a calculation instant
pub type Watermark = i64;

/// Upper bound reported for a log that holds no entry at all
pub const EMPTY_LOG: Watermark = -1;

/// Lower bound a client uses on its very first call
pub const FROM_BEGINNING: Watermark = -1;

/// The user on whose behalf changes are computed, bound to the repository
/// their session is opened on
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    name: String,
    repository: String,
}

impl Principal {
    /// Creates a principal for a user on a repository
    pub fn new(name: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repository: repository.into(),
        }
    }

    /// Returns the user name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the repository of the user's session
    pub fn repository(&self) -> &str {
        &self.repository
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_accessors() {
        let principal = Principal::new("alice", "default");
        assert_eq!(principal.name(), "alice");
        assert_eq!(principal.repository(), "default");
        assert_eq!(principal.to_string(), "alice@default");
    }

    #[test]
    fn test_sentinels() {
        assert_eq!(EMPTY_LOG, -1);
        assert!(FROM_BEGINNING < 0);
    }
}
