//! Configuration loading for picochat.
//!
//! Configuration is loaded from a TOML file (default: `picochat.toml`) and
//! fixed for the life of the process.

use picochat_types::{DEFAULT_BODY_MAX_CHARS, DEFAULT_HISTORY_CAPACITY};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Homeserver and room.
    pub homeserver: HomeserverConfig,
    /// Sync timing and memory limits.
    #[serde(default)]
    pub sync: SyncConfig,
    /// History sizing.
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Homeserver configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct HomeserverConfig {
    /// Base URL, e.g. `https://matrix.org`.
    pub url: String,
    /// Room to follow, e.g. `!abc:matrix.org`.
    pub room_id: String,
    /// Bearer access token.
    pub access_token: String,
}

impl std::fmt::Debug for HomeserverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomeserverConfig")
            .field("url", &self.url)
            .field("room_id", &self.room_id)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Sync timing and memory limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Periodic sync interval in seconds (default: 10).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Per-request transport timeout in seconds (default: 15).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Skip a cycle when free memory is below this many bytes (default: 40 KiB).
    #[serde(default = "default_memory_floor_bytes")]
    pub memory_floor_bytes: u64,
    /// Most bytes a filtered decode may retain (default: 16 KiB).
    #[serde(default = "default_decode_ceiling_bytes")]
    pub decode_ceiling_bytes: usize,
}

/// History sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Messages kept (default: 10).
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
    /// Body cap in characters (default: 119).
    #[serde(default = "default_body_max_chars")]
    pub body_max_chars: usize,
}

// Default value functions
fn default_interval_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_memory_floor_bytes() -> u64 {
    40 * 1024
}

fn default_decode_ceiling_bytes() -> usize {
    16 * 1024
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_body_max_chars() -> usize {
    DEFAULT_BODY_MAX_CHARS
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            memory_floor_bytes: default_memory_floor_bytes(),
            decode_ceiling_bytes: default_decode_ceiling_bytes(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
            body_max_chars: default_body_max_chars(),
        }
    }
}

impl ClientConfig {
    /// Build a configuration with default limits.
    pub fn new(url: &str, room_id: &str, access_token: &str) -> Self {
        Self {
            homeserver: HomeserverConfig {
                url: url.to_string(),
                room_id: room_id.to_string(),
                access_token: access_token.to_string(),
            },
            sync: SyncConfig::default(),
            history: HistoryConfig::default(),
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// [`validate`](Self::validate).
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let hs = &self.homeserver;
        if !(hs.url.starts_with("https://") || hs.url.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "homeserver.url must be an http(s) URL, got {:?}",
                hs.url
            )));
        }
        if hs.room_id.is_empty() {
            return Err(ConfigError::Invalid("homeserver.room_id is empty".into()));
        }
        if hs.access_token.is_empty() {
            return Err(ConfigError::Invalid("homeserver.access_token is empty".into()));
        }
        if self.sync.interval_secs == 0 {
            return Err(ConfigError::Invalid("sync.interval_secs must be > 0".into()));
        }
        if self.history.capacity == 0 || self.history.body_max_chars == 0 {
            return Err(ConfigError::Invalid(
                "history.capacity and history.body_max_chars must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Periodic sync interval.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_secs)
    }

    /// Per-request transport timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.request_timeout_secs)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
