//! Configuration management for the survey report pipeline

pub mod dsn;
pub mod loader;
pub mod settings;
pub mod validation;

pub use loader::{ConfigError, ConfigLoader};
pub use settings::{
    AssemblerConfig, ChartsConfig, Config, DatabaseConfig, ExportConfig, LoggingConfig,
};
