//! In-memory configuration provider

use async_trait::async_trait;
use parking_lot::RwLock;

use super::file::ConfigFile;
use super::traits::{ConfigProvider, ConfigResult};

/// In-memory configuration provider for testing
#[derive(Debug, Default)]
pub struct MemoryConfigProvider {
    config: RwLock<ConfigFile>,
}

impl MemoryConfigProvider {
    pub fn new(config: ConfigFile) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Replace the configuration (useful for testing)
    pub fn set(&self, config: ConfigFile) {
        *self.config.write() = config;
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfigProvider {
    async fn load(&self) -> ConfigResult<ConfigFile> {
        let config = self.config.read().clone();
        config.validate()?;
        Ok(config)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, ServerConfig, ServerList};

    #[tokio::test]
    async fn test_memory_config_provider() {
        let provider = MemoryConfigProvider::default();
        assert!(provider.load().await.unwrap().mcp_servers.is_empty());

        let servers = ServerList::new()
            .with("research", ServerConfig::stdio("uv", vec!["run".to_string()]))
            .unwrap();
        provider.set(ConfigFile {
            mcp_servers: servers,
            defaults: None,
        });
        assert_eq!(provider.load().await.unwrap().mcp_servers.names(), vec!["research"]);
    }

    #[tokio::test]
    async fn test_memory_config_validates() {
        let servers = ServerList::new().with("bad", ServerConfig::http("")).unwrap();
        let provider = MemoryConfigProvider::new(ConfigFile {
            mcp_servers: servers,
            defaults: None,
        });
        assert!(matches!(provider.load().await, Err(ConfigError::Invalid(_))));
    }
}
