//! Reading and writing `config.toml`
//!
//! Writes land in a temporary file in the same directory and are renamed over
//! the target, so readers see either the old file or the new one. The file
//! being replaced is copied to `config.toml.backup` first.

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub(crate) struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("toml.backup")
    }

    /// Reads the file; a missing file yields the defaults.
    ///
    /// A file from an older format version is rewritten at the current one.
    pub fn read(&self) -> ConfigResult<Config> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", self.path.display());
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut config = self.parse(&text)?;
        if config.version < CONFIG_VERSION {
            log::info!(
                "Upgrading {} from format version {} to {}",
                self.path.display(),
                config.version,
                CONFIG_VERSION
            );
            config.version = CONFIG_VERSION;
            self.write(&config)?;
        }

        if let Err(problems) = config.validate() {
            for problem in &problems {
                log::warn!("{}: {}", self.path.display(), problem);
            }
        }
        Ok(config)
    }

    fn parse(&self, text: &str) -> ConfigResult<Config> {
        if text.trim().is_empty() {
            return Err(ConfigError::Empty {
                path: self.path.clone(),
            });
        }
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::TooNew {
                path: self.path.clone(),
                found: config.version,
                supported: CONFIG_VERSION,
            });
        }
        Ok(config)
    }

    /// Validates and writes `config`, keeping the previous file as a backup
    pub fn write(&self, config: &Config) -> ConfigResult<()> {
        config.validate().map_err(ConfigError::Invalid)?;
        let text = toml::to_string_pretty(config)?;

        if self.path.exists() {
            fs::copy(&self.path, self.backup_path()).map_err(|source| self.write_error(source))?;
        }
        self.replace_with(&text)?;

        log::info!("Saved config to {}", self.path.display());
        Ok(())
    }

    /// Writes the default config preceded by a commented header
    pub fn write_template(&self) -> ConfigResult<()> {
        let body = toml::to_string_pretty(&Config::default())?;
        self.replace_with(&format!("{}{}", TEMPLATE_HEADER, body))?;

        log::info!("Wrote default config to {}", self.path.display());
        Ok(())
    }

    fn replace_with(&self, text: &str) -> ConfigResult<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|source| self.write_error(source))?;

        let mut staged = NamedTempFile::new_in(dir).map_err(|source| self.write_error(source))?;
        staged
            .write_all(text.as_bytes())
            .and_then(|()| staged.flush())
            .map_err(|source| self.write_error(source))?;
        staged
            .persist(&self.path)
            .map_err(|e| self.write_error(e.error))?;
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

const TEMPLATE_HEADER: &str = "\
# syncwatch configuration
#
# [store] backend is \"memory\" or \"sqlite\"; a relative database_path is
# resolved against this file's directory.
# [finder] document_events, when set, lists the events that count as document
# changes. Leave it out to report every event under a root.
# [[repositories]] lists every repository. Set clustering_enabled and
# clustering_delay_ms for repositories written by several nodes.
#
# Environment overrides: SYNCWATCH_STORE_DATABASE_PATH, SYNCWATCH_APP_LOG_LEVEL,
# SYNCWATCH_FINDER_DEFAULT_LIMIT.

";
