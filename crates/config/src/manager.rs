//! Locating, loading and saving the syncwatch config

use crate::persistence::ConfigFile;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Owns the config directory; relative store paths resolve against it
pub struct ConfigManager {
    dir: PathBuf,
    file: ConfigFile,
}

impl ConfigManager {
    /// Uses the per-user config directory, e.g. `~/.config/syncwatch` on Linux
    pub fn new() -> ConfigResult<Self> {
        let dirs = ProjectDirs::from("", "", "syncwatch").ok_or(ConfigError::NoConfigDir)?;
        Self::with_directory(dirs.config_dir().to_path_buf())
    }

    pub fn with_directory(dir: PathBuf) -> ConfigResult<Self> {
        let file = ConfigFile::new(dir.join(CONFIG_FILE_NAME));
        Ok(Self { dir, file })
    }

    pub fn config_dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_path(&self) -> &Path {
        self.file.path()
    }

    /// Reads the file as written, defaults when it is missing
    pub fn load(&self) -> ConfigResult<Config> {
        self.file.read()
    }

    /// Reads the file, then applies the `SYNCWATCH_*` environment overrides
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok());
        if let Err(problems) = config.validate() {
            log::warn!("Invalid values after environment overrides: {:?}", problems);
        }
        Ok(config)
    }

    /// Validates and atomically writes `config`
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.file.write(config)
    }

    /// Writes the commented default file unless one exists; true when written
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.file.path().exists() {
            log::info!("Keeping existing config at {}", self.file.path().display());
            return Ok(false);
        }
        self.file.write_template()?;
        Ok(true)
    }
}

pub const ENV_DATABASE_PATH: &str = "SYNCWATCH_STORE_DATABASE_PATH";
pub const ENV_LOG_LEVEL: &str = "SYNCWATCH_APP_LOG_LEVEL";
pub const ENV_DEFAULT_LIMIT: &str = "SYNCWATCH_FINDER_DEFAULT_LIMIT";

/// Applies the overrides `lookup` finds; a value that does not parse is
/// skipped with a warning
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup(ENV_DATABASE_PATH) {
        config.store.database_path = PathBuf::from(path);
    }

    if let Some(raw) = lookup(ENV_LOG_LEVEL) {
        match raw.parse::<LogLevel>() {
            Ok(level) => config.app.log_level = level,
            Err(e) => log::warn!("Ignoring {}: {}", ENV_LOG_LEVEL, e),
        }
    }

    if let Some(raw) = lookup(ENV_DEFAULT_LIMIT) {
        match raw.trim().parse::<usize>() {
            Ok(limit) => config.finder.default_limit = limit,
            Err(e) => log::warn!("Ignoring {}={}: {}", ENV_DEFAULT_LIMIT, raw, e),
        }
    }
}
