//! Configuration management for mongosnap
//!
//! This module handles loading, parsing, and managing configuration from
//! various sources:
//! - Configuration files (TOML format)
//! - Environment variables
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables (`MONGODB_URI`, `DB_NAME`)
//! 3. Configuration file
//! 4. Default values
//!
//! The connection URI is deliberately never defaulted: live credentials do
//! not belong in source or in shipped defaults, so a run without a URI from
//! one of the sources above fails with a configuration error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Environment variable holding the MongoDB connection URI.
pub const ENV_URI: &str = "MONGODB_URI";

/// Environment variable holding the database name.
pub const ENV_DATABASE: &str = "DB_NAME";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Export configuration
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// MongoDB connection URI (no default; see module docs)
    #[serde(default)]
    pub uri: Option<String>,

    /// Database name holding the collections to export
    #[serde(default = "default_database")]
    pub database: String,

    /// Server selection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Export-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory receiving the exported JSON files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Number of documents fetched per cursor batch
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Sort documents by `_id` ascending for reproducible output.
    ///
    /// The underlying store has no defined ordering; this opts in to a
    /// stable one. Off by default to match the unordered snapshot reads
    /// the tool replaces.
    #[serde(default)]
    pub stable_order: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Map to a `tracing` level for subscriber setup.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions
fn default_database() -> String {
    "lesson_booking".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_batch_size() -> u32 {
    1000
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: None,
            database: default_database(),
            timeout: default_timeout(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            batch_size: default_batch_size(),
            stable_order: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then apply
    /// environment variable overrides.
    ///
    /// # Arguments
    /// * `path` - Config file path; `None` uses defaults
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(p) => {
                let content = std::fs::read_to_string(p).map_err(|_| {
                    ConfigError::FileNotFound(p.display().to_string())
                })?;
                toml::from_str(&content)
                    .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?
            }
            None => Config::default(),
        };

        config.apply_env();
        Ok(config)
    }

    /// Apply environment variable overrides (`MONGODB_URI`, `DB_NAME`).
    pub fn apply_env(&mut self) {
        if let Ok(uri) = std::env::var(ENV_URI)
            && !uri.is_empty()
        {
            self.connection.uri = Some(uri);
        }
        if let Ok(db) = std::env::var(ENV_DATABASE)
            && !db.is_empty()
        {
            self.connection.database = db;
        }
    }

    /// Return the connection URI, failing if none was configured.
    pub fn require_uri(&self) -> Result<&str> {
        self.connection
            .uri
            .as_deref()
            .ok_or_else(|| {
                ConfigError::MissingField(format!("connection.uri (or {ENV_URI})")).into()
            })
    }

    /// Server selection timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.connection.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.connection.uri.is_none());
        assert_eq!(config.connection.database, "lesson_booking");
        assert_eq!(config.connection.timeout, 30);
        assert_eq!(config.export.output_dir, PathBuf::from("exports"));
        assert_eq!(config.export.batch_size, 1000);
        assert!(!config.export.stable_order);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [connection]
            uri = "mongodb://localhost:27017"
            database = "booking_test"

            [export]
            output_dir = "out"
            stable_order = true
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.connection.uri.as_deref(),
            Some("mongodb://localhost:27017")
        );
        assert_eq!(config.connection.database, "booking_test");
        assert_eq!(config.export.output_dir, PathBuf::from("out"));
        assert!(config.export.stable_order);
        // unset sections fall back to defaults
        assert_eq!(config.export.batch_size, 1000);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_require_uri_missing() {
        let config = Config::default();
        let err = config.require_uri().unwrap_err();
        assert!(err.to_string().contains("connection.uri"));
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(LogLevel::Debug.to_tracing_level(), tracing::Level::DEBUG);
        assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
