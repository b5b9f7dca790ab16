//! Configuration loading utilities

use crate::Config;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use survey_common::ReportError;
use thiserror::Error;
use tracing::debug;

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "REPORT_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Connection string the driver cannot use
    #[error("Invalid database DSN: {0}")]
    InvalidDsn(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),
}

impl From<ConfigError> for ReportError {
    fn from(err: ConfigError) -> Self {
        ReportError::config_with_source("configuration rejected", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config = Config::from_str(&content)?;

        Self::apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from the first file found, falling back to defaults
    ///
    /// Search order: `$REPORT_CONFIG_PATH`, `report.yaml`, `report.yml`.
    pub fn load() -> Result<Config, ConfigError> {
        match Self::locate() {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration file");
                Self::load_config(path)
            }
            None => {
                debug!("no configuration file found, using defaults");
                let mut config = Config::default();
                Self::apply_env_overrides(&mut config)?;
                config.validate_all()?;
                Ok(config)
            }
        }
    }

    /// Load configuration from an explicit file, or search when `None`
    pub fn load_from(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load_config(path),
            None => Self::load(),
        }
    }

    fn locate() -> Option<PathBuf> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        ["report.yaml", "report.yml"]
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        if let Some(dsn) = non_empty_var("MYSQL_DSN") {
            config.database.url = Some(dsn);
        }

        if let Some(host) = non_empty_var("MYSQL_HOST") {
            config.database.host = host;
        }

        if let Some(port) = non_empty_var("MYSQL_PORT") {
            config.database.port = parse_var("MYSQL_PORT", &port)?;
        }

        if let Some(name) = non_empty_var("MYSQL_DB") {
            config.database.name = name;
        }

        if let Some(user) = non_empty_var("MYSQL_USER") {
            config.database.user = user;
        }

        if let Ok(password) = env::var("MYSQL_PASS") {
            config.database.password = password;
        }

        if let Some(timeout) = non_empty_var("REPORT_DB_TIMEOUT") {
            config.database.timeout_seconds = parse_var("REPORT_DB_TIMEOUT", &timeout)?;
        }

        if let Some(level) = non_empty_var("LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(file) = non_empty_var("LOG_FILE") {
            config.logging.file = Some(PathBuf::from(file));
        }

        Ok(())
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::EnvParseError {
        var: var.to_string(),
        source: Box::new(e),
    })
}
