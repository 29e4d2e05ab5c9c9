//! Log store configuration section

use crate::validation::{ConfigSection, ValidationReport};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage engine holding the audit log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local log, lost on exit
    Memory,
    /// SQLite database file
    Sqlite,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Log store settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Which backend to use
    pub backend: StoreBackend,

    /// Database file path (relative to config dir if not absolute)
    pub database_path: PathBuf,

    /// Maximum number of pooled connections
    pub max_connections: u32,

    /// Enable SQLite write-ahead logging
    pub enable_wal: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_path: PathBuf::from("syncwatch.db"),
            max_connections: 10,
            enable_wal: true,
        }
    }
}

impl StoreConfig {
    /// Database path, resolved against `base` when relative
    pub fn resolved_database_path(&self, base: &std::path::Path) -> PathBuf {
        if self.database_path.is_absolute() {
            self.database_path.clone()
        } else {
            base.join(&self.database_path)
        }
    }
}

impl ConfigSection for StoreConfig {
    fn check(&self, report: &mut ValidationReport) {
        if self.backend == StoreBackend::Sqlite && self.database_path.as_os_str().is_empty() {
            report.reject("store.database_path", "the sqlite backend needs a file");
        }
        report.require_within("store.max_connections", self.max_connections, 1..=64);
    }
}
