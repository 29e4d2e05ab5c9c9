//! `[app]`: process-wide settings

use crate::validation::{ConfigSection, ValidationError, ValidationReport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default `env_logger` filter; `RUST_LOG` still wins
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

const LEVEL_NAMES: [(LogLevel, &str); 5] = [
    (LogLevel::Error, "error"),
    (LogLevel::Warn, "warn"),
    (LogLevel::Info, "info"),
    (LogLevel::Debug, "debug"),
    (LogLevel::Trace, "trace"),
];

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = LEVEL_NAMES
            .iter()
            .find(|(level, _)| level == self)
            .map_or("info", |(_, name)| *name);
        f.write_str(name)
    }
}

impl FromStr for LogLevel {
    type Err = ValidationError;

    /// Case-insensitive; `warning` is accepted for `warn`
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim().to_ascii_lowercase();
        let wanted = if wanted == "warning" { "warn" } else { wanted.as_str() };
        LEVEL_NAMES
            .iter()
            .find(|(_, name)| *name == wanted)
            .map(|(level, _)| *level)
            .ok_or_else(|| {
                ValidationError::new(
                    "app.log_level",
                    format!("'{}' is not one of error, warn, info, debug, trace", raw),
                )
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_level: LogLevel::Info,
        }
    }
}

// Every level is valid; serde already refuses unknown names
impl ConfigSection for AppConfig {
    fn check(&self, _report: &mut ValidationReport) {}
}
