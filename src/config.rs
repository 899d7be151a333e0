//! Configuration loading.
//!
//! Two layers: built-in defaults, then an optional TOML file. Every field
//! has a default, so a missing or partial file is never an error; only an
//! unreadable or unparsable file is.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::DEFAULT_TIMEOUT;
use crate::store::registry::{DEFAULT_EXPIRY_DAYS, DEFAULT_PURPOSE};
use crate::store::simple::DEFAULT_PREFIX;

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no usable config directory on this platform")]
    NoConfigDir,
}

/// Which cache backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Flat files in the temp directory; no expiry, no persistence
    /// guarantees.
    #[default]
    Simple,
    /// Persistent registry with time-based eviction.
    Registry,
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache backend to use.
    pub backend: Backend,

    /// Override for the cache location: the entry directory for the
    /// simple backend, the registry root for the registry backend.
    pub cache_dir: Option<PathBuf>,

    /// File-name prefix for simple-backend entries.
    pub file_prefix: String,

    /// Purpose tag namespacing registry entries.
    pub purpose: String,

    /// Expiry horizon for new registry entries, in days.
    pub expiry_days: u32,

    /// Seconds before a hung extractor is killed.
    pub generator_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Simple,
            cache_dir: None,
            file_prefix: DEFAULT_PREFIX.to_string(),
            purpose: DEFAULT_PURPOSE.to_string(),
            expiry_days: DEFAULT_EXPIRY_DAYS,
            generator_timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the platform config file when `None`.
    /// A file that does not exist yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Platform-specific default config file location.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dirs =
            ProjectDirs::from("dev", "thumbcache", "thumbcache").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Extractor deadline as a duration.
    pub fn generator_timeout(&self) -> Duration {
        Duration::from_secs(self.generator_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_the_simple_backend() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::Simple);
        assert_eq!(config.expiry_days, DEFAULT_EXPIRY_DAYS);
        assert_eq!(config.file_prefix, DEFAULT_PREFIX);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str("backend = \"registry\"").unwrap();
        assert_eq!(config.backend, Backend::Registry);
        assert_eq!(config.purpose, DEFAULT_PURPOSE);
        assert_eq!(config.generator_timeout_seconds, DEFAULT_TIMEOUT.as_secs());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(toml::from_str::<Config>("backend = \"fancy\"").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.backend, Backend::Simple);
    }
}
