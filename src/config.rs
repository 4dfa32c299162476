//! Relay configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file
//! (or no file at all) yields a working server.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::types::DuplicateNamePolicy;

/// Default listen address
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the acceptor binds to.
    pub listen: String,
    /// Seconds a connection may stay silent before it is torn down.
    /// Unset means reads block until the peer closes.
    pub idle_timeout_secs: Option<u64>,
    /// Longest accepted line in bytes.
    pub max_line_length: usize,
    /// ChatServer command channel capacity.
    pub command_buffer: usize,
    /// What to do when a name is registered twice.
    pub duplicate_names: DuplicateNamePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            idle_timeout_secs: None,
            max_line_length: 8192,
            command_buffer: 256,
            duplicate_names: DuplicateNamePolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Idle timeout as a `Duration`, if enabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}
