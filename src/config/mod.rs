//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::calculate::leaderboard::MAX_LIMIT;
use crate::calculate::{backend_from_name, StatsBackend};
use crate::engine::EngineSettings;
use crate::parse_duration;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Statistics engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Snapshot lifetime, e.g. "1h", "30m", "90s"
    #[serde(default = "default_snapshot_ttl")]
    pub snapshot_ttl: String,

    /// Numeric backend: "statrs" or "none"
    #[serde(default = "default_stats_backend")]
    pub backend: String,

    /// Supplied upstream; only used in badge descriptions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_power_cap: Option<u32>,

    #[serde(default = "default_leaderboard_limit")]
    pub leaderboard_default_limit: u32,

    #[serde(default = "default_leaderboard_max")]
    pub leaderboard_max_limit: u32,
}

fn default_snapshot_ttl() -> String {
    "1h".to_string()
}

fn default_stats_backend() -> String {
    "statrs".to_string()
}

fn default_leaderboard_limit() -> u32 {
    10
}

fn default_leaderboard_max() -> u32 {
    MAX_LIMIT
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            snapshot_ttl: default_snapshot_ttl(),
            backend: default_stats_backend(),
            current_power_cap: None,
            leaderboard_default_limit: default_leaderboard_limit(),
            leaderboard_max_limit: default_leaderboard_max(),
        }
    }
}

impl StatsConfig {
    /// Parsed snapshot TTL.
    pub fn snapshot_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        let ttl = parse_duration(&self.snapshot_ttl).ok_or_else(|| {
            ConfigError::ValidationError(format!("Invalid snapshot_ttl: {:?}", self.snapshot_ttl))
        })?;
        if ttl.is_zero() {
            return Err(ConfigError::ValidationError(
                "snapshot_ttl must be greater than 0".to_string(),
            ));
        }
        chrono::Duration::from_std(ttl)
            .map_err(|e| ConfigError::ValidationError(format!("snapshot_ttl out of range: {}", e)))
    }

    /// The configured numeric backend.
    pub fn stats_backend(&self) -> Result<Arc<dyn StatsBackend>, ConfigError> {
        backend_from_name(&self.backend).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "Unknown stats backend {:?} (expected \"statrs\" or \"none\")",
                self.backend
            ))
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            current_power_cap: self.current_power_cap,
            leaderboard_default_limit: self.leaderboard_default_limit,
            leaderboard_max_limit: self.leaderboard_max_limit,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub stats: StatsConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            server: ServerConfig::default(),
            stats: StatsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            info!("No config file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        self.stats.snapshot_ttl()?;
        self.stats.stats_backend()?;

        let stats = &self.stats;
        if stats.leaderboard_default_limit == 0 {
            return Err(ConfigError::ValidationError(
                "leaderboard_default_limit must be greater than 0".to_string(),
            ));
        }
        if stats.leaderboard_max_limit > MAX_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "leaderboard_max_limit must be at most {}",
                MAX_LIMIT
            )));
        }
        if stats.leaderboard_default_limit > stats.leaderboard_max_limit {
            return Err(ConfigError::ValidationError(
                "leaderboard_default_limit exceeds leaderboard_max_limit".to_string(),
            ));
        }

        Ok(())
    }
}
