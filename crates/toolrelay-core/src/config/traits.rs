//! Configuration provider trait

use std::path::PathBuf;

use async_trait::async_trait;

use super::file::ConfigFile;

/// Configuration provider abstraction
///
/// Implementations:
/// - `FileConfigProvider`: JSON or YAML file on disk
/// - `MemoryConfigProvider`: In-memory for testing
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Load the full configuration
    async fn load(&self) -> ConfigResult<ConfigFile>;

    /// Where the configuration comes from, for diagnostics
    fn describe(&self) -> String;
}

/// Errors that can occur while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
