//! Configuration management (`config.toml`)
//!
//! Every section and field is optional; missing values take their defaults.
//! The file is only ever read, never written.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::assistant::AssistantConfig;
use crate::dataset::DatasetConfig;
use crate::executor::ExecutorConfig;
use crate::playback::PlaybackConfig;

const CONFIG_FILE: &str = "config.toml";

/// Application configuration, one field per TOML section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Sandbox limits
    #[serde(default)]
    pub execution: ExecutorConfig,
    /// Playback timer
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Initial values and random resets
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// AI collaborator
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", .path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/algoviz`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "algoviz").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory, where the log file lives.
///
/// On Linux: `~/.local/share/algoviz`
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "algoviz").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Loads the configuration.
///
/// An explicit `path` must exist and parse. Without one, `config.toml` in
/// [`config_dir`] is used when present and defaults otherwise; a broken
/// default file is logged and ignored.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = path {
        return read(path);
    }

    let Some(path) = config_dir().map(|dir| dir.join(CONFIG_FILE)) else {
        return Ok(Config::default());
    };
    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    match read(&path) {
        Ok(config) => Ok(config),
        Err(err) => {
            warn!(error = %err, "ignoring config file");
            Ok(Config::default())
        }
    }
}

fn read(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Parse configuration from TOML text
pub fn parse(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}
