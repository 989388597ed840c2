//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration for the retrieval core, supporting TOML files
//! and environment-variable overrides with validation and type-safe access.
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables
//! 2. Configuration file (TOML)
//! 3. Default values
//!
//! ## Usage
//! ```rust
//! use german_law_retrieval_core::config::Config;
//!
//! let config = Config::load(None).unwrap_or_default();
//! println!("Store path: {}", config.store.db_path);
//! ```

use crate::errors::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the retrieval core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
}

/// Front-door transport settings. Transport framing itself lives outside
/// the core (spec §1); this only carries what the binary needs to start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Indexed-corpus store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub db_path: String,
    pub busy_timeout_ms: u64,
    pub read_only: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "data/corpus.db".to_string(),
            busy_timeout_ms: 5000,
            read_only: true,
        }
    }
}

/// Structured-logging settings, mirroring the teacher's `LoggingConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Settings for the out-of-scope ingestion collaborator, invoked as a
/// subprocess by `run_ingestion`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    pub binary_path: Option<String>,
    #[serde(default)]
    pub default_args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            default_args: Vec::new(),
            timeout_secs: 120,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
            ingestion: IngestionConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from `path` if given, else from the default
    /// location `config.toml` in the current directory if it exists,
    /// falling back to defaults. Environment overrides are always applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = PathBuf::from("config.toml");
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    tracing::warn!("no config file found, using defaults");
                    Config::default()
                }
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let toml_str = self.to_toml()?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CoreError::internal(format!("failed to serialize config: {e}")))
    }

    /// Applies `LEGAL_RETRIEVAL_*` environment variable overrides, following
    /// the teacher's `apply_env_overrides` precedence pattern.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("LEGAL_RETRIEVAL_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("LEGAL_RETRIEVAL_PORT") {
            if let Ok(p) = port.parse::<u16>() {
                self.server.port = p;
            }
        }
        if let Ok(db_path) = std::env::var("LEGAL_RETRIEVAL_DB_PATH") {
            self.store.db_path = db_path;
        }
        if let Ok(level) = std::env::var("LEGAL_RETRIEVAL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(binary) = std::env::var("LEGAL_RETRIEVAL_INGESTION_BIN") {
            self.ingestion.binary_path = Some(binary);
        }
    }

    /// Validates field-scoped constraints, following the teacher's
    /// field-scoped `ValidationFailed` pattern.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(CoreError::Config {
                message: "server.port must not be zero".to_string(),
            });
        }
        if self.store.db_path.trim().is_empty() {
            return Err(CoreError::Config {
                message: "store.db_path must not be empty".to_string(),
            });
        }
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(CoreError::Config {
                message: format!(
                    "logging.level '{}' is not one of {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_db_path() {
        let mut config = Config::default();
        config.store.db_path = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config::default();
        let toml_str = config.to_toml().expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("parse");
        assert_eq!(parsed.store.db_path, config.store.db_path);
    }
}
