//! Config loading and saving failures

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An empty file is treated as damaged, not as "use the defaults"
    #[error("{path} is empty")]
    Empty { path: PathBuf },

    #[error("Cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{path} has format version {found}; this build reads up to {supported}")]
    TooNew {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("Refusing to save an invalid configuration: {}", list(.0))]
    Invalid(Vec<ValidationError>),

    #[error("Cannot encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No config directory is known for the current user")]
    NoConfigDir,
}

fn list(problems: &[ValidationError]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// One bad value, named by its dotted TOML key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub key: String,
    pub problem: String,
}

impl ValidationError {
    pub fn new(key: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.problem)
    }
}

impl std::error::Error for ValidationError {}
