#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for tap
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/tap/config.toml)
//! - Environment variables (`TAP_*`)
//! - CLI flags, applied by the binary last

pub mod constants;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tap_errors::{ConfigError, Error};
use tokio::fs;
use tracing::debug;

use constants::{
    APP_DIR, CONFIG_FILE, ENV_BIN_DIR, ENV_RETRIES, ENV_TABLE, ENV_TEMP_DIR, ENV_TIMEOUT,
};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct PathConfig {
    /// Directory the executable is installed into
    pub bin_dir: Option<PathBuf>,
    /// Parent of the scoped download directory
    pub temp_dir: Option<PathBuf>,
    /// Release table overriding the embedded one
    pub table: Option<PathBuf>,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
    #[serde(default)]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64, // seconds
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            retries: 0,
            retry_delay: default_retry_delay(),
            user_agent: None,
        }
    }
}

impl NetworkConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }
}

// Default value functions for serde
fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_retry_delay() -> u64 {
    1 // 1 second
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        debug!(path = %path.display(), "loaded config file");

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: format!("{}: {e}", path.display()),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let Ok(config_path) = Self::default_path() else {
            return Ok(Self::default());
        };

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// An explicitly named file must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge values from a variable lookup, `TAP_*` names as keys
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparseable numbers.
    pub fn merge_vars<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_BIN_DIR).filter(|v| !v.is_empty()) {
            self.paths.bin_dir = Some(PathBuf::from(dir));
        }

        if let Some(dir) = lookup(ENV_TEMP_DIR).filter(|v| !v.is_empty()) {
            self.paths.temp_dir = Some(PathBuf::from(dir));
        }

        if let Some(table) = lookup(ENV_TABLE).filter(|v| !v.is_empty()) {
            self.paths.table = Some(PathBuf::from(table));
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            self.network.timeout = timeout.parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_TIMEOUT.to_string(),
                value: timeout,
            })?;
        }

        if let Some(retries) = lookup(ENV_RETRIES) {
            self.network.retries = retries.parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_RETRIES.to_string(),
                value: retries,
            })?;
        }

        Ok(())
    }

    /// Get the bin directory (with default `~/.local/bin`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when no bin directory is
    /// configured and the home directory cannot be determined.
    pub fn bin_dir(&self) -> Result<PathBuf, Error> {
        if let Some(dir) = &self.paths.bin_dir {
            return Ok(dir.clone());
        }
        dirs::home_dir()
            .map(|home| home.join(".local").join("bin"))
            .ok_or_else(|| {
                ConfigError::MissingField {
                    field: "paths.bin_dir".to_string(),
                }
                .into()
            })
    }

    /// Get the temp directory (with default from the OS)
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.paths
            .temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
