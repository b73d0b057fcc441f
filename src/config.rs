//! Configuration for pqstego, stored in `~/.pqstego/config.toml`.
//!
//! ```toml
//! keys_dir = "/home/alice/.pqstego/keys"
//! framing = "length-prefix"
//! log_filter = "pqstego=debug"
//! ```
//!
//! Every field is optional. Command-line flags override file values.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::stego::Framing;

/// Name of the per-user directory under the home directory.
const APP_DIR: &str = ".pqstego";

/// Default log filter when neither the config nor `RUST_LOG` sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found. Unable to determine home directory.")]
    NoConfigDir,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

/// User configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Directory holding key pair records. Defaults to `~/.pqstego/keys`.
    pub keys_dir: Option<PathBuf>,

    /// Framing used by hide, reveal and capacity.
    pub framing: Framing,

    /// `tracing` filter directive, e.g. `"info"` or `"pqstego=debug"`.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keys_dir: None,
            framing: Framing::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration from the default location.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Loads the configuration from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Path to the default configuration file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(get_config_dir()?.join("config.toml"))
    }

    /// The key store directory: the configured one, or `~/.pqstego/keys`.
    pub fn keys_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.keys_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(get_config_dir()?.join("keys")),
        }
    }
}

/// Get the pqstego configuration directory (`~/.pqstego`).
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(APP_DIR))
        .ok_or(ConfigError::NoConfigDir)
}
