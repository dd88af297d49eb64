//! Configuration loading and validation for mcremote.
//!
//! Loads configuration from `~/.mcremote/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Backends that can be selected in `[backend] kind`.
pub const KNOWN_BACKENDS: &[&str] = &["sim"];

/// The root configuration structure.
///
/// Maps directly to `~/.mcremote/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Identity advertised during the protocol handshake
    #[serde(default)]
    pub server: ServerConfig,

    /// Game connection defaults
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Per-action wait limits
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Entity and villager search radii
    #[serde(default)]
    pub search: SearchConfig,

    /// Which game-client backend to use
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_name")]
    pub name: String,

    #[serde(default = "default_server_version")]
    pub version: String,
}

fn default_server_name() -> String {
    "MinecraftRemote".into()
}
fn default_server_version() -> String {
    "0.1.0".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            version: default_server_version(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Port used when a connect call omits one
    #[serde(default = "default_port")]
    pub default_port: u16,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_port() -> u16 {
    25565
}
fn default_connect_timeout() -> u64 {
    10
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            default_port: default_port(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Pathfinding limit for `moveTo`
    #[serde(default = "default_move_secs")]
    pub move_secs: u64,

    /// Limit for `digBlock`
    #[serde(default = "default_dig_secs")]
    pub dig_secs: u64,
}

fn default_move_secs() -> u64 {
    60
}
fn default_dig_secs() -> u64 {
    30
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            move_secs: default_move_secs(),
            dig_secs: default_dig_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default radius for `getNearbyEntities`
    #[serde(default = "default_entity_range")]
    pub entity_range: f64,

    /// Default radius for villager lookups
    #[serde(default = "default_villager_range")]
    pub villager_range: f64,

    /// Default distance kept by `followEntity`
    #[serde(default = "default_follow_distance")]
    pub follow_distance: f64,
}

fn default_entity_range() -> f64 {
    10.0
}
fn default_villager_range() -> f64 {
    4.0
}
fn default_follow_distance() -> f64 {
    2.0
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            entity_range: default_entity_range(),
            villager_range: default_villager_range(),
            follow_distance: default_follow_distance(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_kind")]
    pub kind: String,
}

fn default_backend_kind() -> String {
    "sim".into()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: default_backend_kind(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.mcremote/config.toml).
    ///
    /// Environment overrides:
    /// - `MCREMOTE_BACKEND`
    /// - `MCREMOTE_CONNECT_TIMEOUT_SECS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production).
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(kind) = lookup("MCREMOTE_BACKEND") {
            self.backend.kind = kind;
        }

        if let Some(secs) = lookup("MCREMOTE_CONNECT_TIMEOUT_SECS") {
            self.connection.connect_timeout_secs = secs.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "MCREMOTE_CONNECT_TIMEOUT_SECS must be a whole number of seconds, got '{secs}'"
                ))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".mcremote")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "connection.connect_timeout_secs must be > 0".into(),
            ));
        }

        if self.timeouts.move_secs == 0 || self.timeouts.dig_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts.move_secs and timeouts.dig_secs must be > 0".into(),
            ));
        }

        let ranges = [
            ("search.entity_range", self.search.entity_range),
            ("search.villager_range", self.search.villager_range),
            ("search.follow_distance", self.search.follow_distance),
        ];
        for (key, value) in ranges {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::ValidationError(format!("{key} must be > 0")));
            }
        }

        if !KNOWN_BACKENDS.contains(&self.backend.kind.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown backend '{}' (known: {})",
                self.backend.kind,
                KNOWN_BACKENDS.join(", ")
            )));
        }

        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connection.connect_timeout_secs)
    }

    pub fn move_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.move_secs)
    }

    pub fn dig_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.dig_secs)
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
