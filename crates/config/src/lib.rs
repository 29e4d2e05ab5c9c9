//! syncwatch configuration
//!
//! One TOML file describes the log store, the event names the change finder
//! recognises and the repository table. Each section checks its own values
//! through [`ConfigSection`]; a file with bad values still loads, with a
//! warning, but is never written back.
//!
//! ```rust,no_run
//! use syncwatch_config::ConfigManager;
//!
//! let manager = ConfigManager::new().expect("no config directory");
//! let config = manager.load_with_env_overrides().expect("unreadable config");
//! println!("store backend: {}", config.store.backend);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

// Config sections
pub mod app_config;
mod finder_config;
mod repositories_config;
mod store_config;

pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{
    apply_env_overrides, ConfigManager, CONFIG_FILE_NAME, ENV_DATABASE_PATH, ENV_DEFAULT_LIMIT,
    ENV_LOG_LEVEL,
};
pub use validation::{ConfigSection, ValidationReport};

// Re-export config sections
pub use app_config::{AppConfig, LogLevel};
pub use finder_config::FinderConfig;
pub use repositories_config::{RepositoryConfig, RepositoryTable};
pub use store_config::{StoreBackend, StoreConfig};

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Config file format version
    pub version: u32,

    /// Application-level settings
    pub app: AppConfig,

    /// Log store settings
    pub store: StoreConfig,

    /// Change finder settings
    pub finder: FinderConfig,

    /// Repository table
    pub repositories: RepositoryTable,
}

impl Config {
    /// Checks every section, collecting all problems
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut report = ValidationReport::default();
        self.app.check(&mut report);
        self.store.check(&mut report);
        self.finder.check(&mut report);
        self.repositories.check(&mut report);
        report.finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            store: StoreConfig::default(),
            finder: FinderConfig::default(),
            repositories: RepositoryTable::default(),
        }
    }
}
