//! # Engine Configuration
//!
//! Configuration management for the cash desk engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TILL_DB_PATH=/var/lib/till/till.db                                 │
//! │     TILL_DB_MAX_CONNECTIONS=5                                          │
//! │     TILL_LOG=info,till=debug                                           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/desk/till.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.till.desk/till.toml (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     database in the platform data dir, Argon2 library defaults         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # till.toml
//! [database]
//! path = "/var/lib/till/till.db"
//! max_connections = 5
//!
//! [authorization]
//! min_secret_length = 4
//! argon2_memory_kib = 19456
//! argon2_iterations = 2
//! argon2_parallelism = 1
//!
//! [logging]
//! filter = "info,till=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use till_core::{Argon2Settings, SecretHasher, MIN_AUTHORIZATION_SECRET_LEN};
use till_db::DbConfig;

use crate::DEFAULT_LOG_FILTER;

// =============================================================================
// Config Error
// =============================================================================

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No config path available on this platform")]
    NoConfigPath,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. `None` means `till.db` in the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

/// `[authorization]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationSettings {
    /// Shortest accepted company authorization secret.
    #[serde(default = "default_min_secret_length")]
    pub min_secret_length: usize,

    #[serde(default = "default_argon2_memory")]
    pub argon2_memory_kib: u32,

    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

fn default_min_secret_length() -> usize {
    MIN_AUTHORIZATION_SECRET_LEN
}
fn default_argon2_memory() -> u32 {
    Argon2Settings::default().memory_kib
}
fn default_argon2_iterations() -> u32 {
    Argon2Settings::default().iterations
}
fn default_argon2_parallelism() -> u32 {
    Argon2Settings::default().parallelism
}

impl Default for AuthorizationSettings {
    fn default() -> Self {
        AuthorizationSettings {
            min_secret_length: default_min_secret_length(),
            argon2_memory_kib: default_argon2_memory(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl AuthorizationSettings {
    pub fn argon2(&self) -> Argon2Settings {
        Argon2Settings {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive string.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub authorization: AuthorizationSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (till.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. Missing sections and keys take defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.authorization.min_secret_length < MIN_AUTHORIZATION_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "authorization.min_secret_length must be at least {}",
                MIN_AUTHORIZATION_SECRET_LEN
            )));
        }

        SecretHasher::new(self.authorization.argon2())
            .map_err(|e| ConfigError::Invalid(format!("authorization argon2 parameters: {e}")))?;

        Ok(())
    }

    /// Applies `TILL_*` overrides through `lookup` (the process environment
    /// in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("TILL_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(max) = lookup("TILL_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(m) => self.database.max_connections = m,
                Err(_) => warn!(value = %max, "Ignoring invalid TILL_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(filter) = lookup("TILL_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "till", "desk")
            .map(|dirs| dirs.config_dir().join("till.toml"))
    }

    /// Default database location in the platform data directory.
    fn default_database_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "till", "desk")
            .map(|dirs| dirs.data_dir().join("till.db"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Builds the ledger store configuration.
    pub fn db_config(&self) -> ConfigResult<DbConfig> {
        let path = self
            .database
            .path
            .clone()
            .or_else(Self::default_database_path)
            .ok_or(ConfigError::NoConfigPath)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Ok(DbConfig::new(path).max_connections(self.database.max_connections))
    }

    /// Builds the credential hasher.
    pub fn secret_hasher(&self) -> ConfigResult<SecretHasher> {
        SecretHasher::new(self.authorization.argon2())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
