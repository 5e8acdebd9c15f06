//! Configuration provider abstractions
//!
//! Supports multiple configuration sources:
//! - `FileConfigProvider`: JSON or YAML file (explicit, user or workspace level)
//! - `MemoryConfigProvider`: In-memory for testing

mod traits;
mod servers;
mod memory;
mod file;

pub use traits::{ConfigProvider, ConfigError, ConfigResult};
pub use servers::{ServerConfig, NamedServer, ServerList};
pub use memory::MemoryConfigProvider;
pub use file::{FileConfigProvider, ConfigFile, ConfigLevel, DefaultSettings, WORKSPACE_CONFIG_FILE};
