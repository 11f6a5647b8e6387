//! Configuration management.
//!
//! Configuration is read from `~/.config/scoreline/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is
//! created. Missing fields fall back to defaults.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde::Deserialize;

use crate::fetcher::scheduler::{BACKGROUND_WORKERS, FILTER_WORKERS};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub roster: RosterConfig,
    pub scheduler: SchedulerConfig,
    /// Override for the cache database location.
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the judge's per-problem status pages; the lookup for an
    /// item is `GET {base_url}/{id}/`.
    pub base_url: String,
    /// Session cookie sent with each lookup, for judges that only show
    /// submission history to a logged-in user.
    pub cookie: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://judge.example.com/problem".to_string(),
            cookie: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RosterConfig {
    /// Roster file location; defaults to `roster.toml` next to the config.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub filter_workers: usize,
    pub background_workers: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            filter_workers: FILTER_WORKERS,
            background_workers: BACKGROUND_WORKERS,
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating a commented
    /// default file on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/scoreline/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("scoreline").join("config.toml"))
    }

    /// Resolved roster path: the configured one, or `roster.toml` next to
    /// the config file.
    pub fn roster_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.roster.path {
            Some(path) => Ok(path.clone()),
            None => {
                let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
                Ok(config_dir.join("scoreline").join("roster.toml"))
            }
        }
    }

    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let default_config = Self::default_config_content();

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(default_config.as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# Scoreline configuration

[remote]
# Base URL of the judge's per-problem status pages.
# The lookup for an item is GET {base_url}/{id}/
base_url = "https://judge.example.com/problem"

# Session cookie sent with each lookup, e.g. "sessionid=abc123".
# Leave commented out for judges with public submission history.
# cookie = ""

[roster]
# Roster file listing groups of problem links with observed markers.
# Defaults to roster.toml next to this file.
# path = "/home/me/.config/scoreline/roster.toml"

[scheduler]
# Concurrent lookups while resolving submission times for threshold
# filtering, and while classifying items with unknown status.
filter_workers = 3
background_workers = 2

# Override for the cache database location (defaults to the user data dir).
# db_path = "/home/me/.local/share/scoreline/scoreline.db"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
