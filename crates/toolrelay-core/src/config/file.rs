//! File-based configuration provider (JSON or YAML)
//!
//! Supports an explicit path, a user-level file
//! (`<config_dir>/toolrelay/servers.yaml`) and a workspace-level file
//! (`<root>/server_config.json`).

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::servers::ServerList;
use super::traits::{ConfigError, ConfigProvider, ConfigResult};

/// Workspace config file name
pub const WORKSPACE_CONFIG_FILE: &str = "server_config.json";

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Tool servers in registration order
    #[serde(rename = "mcpServers", alias = "mcp_servers", default)]
    pub mcp_servers: ServerList,

    /// Default settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultSettings>,
}

impl ConfigFile {
    /// Parse config text, picking the format from the file extension
    ///
    /// `.json` is JSON, `.yaml`/`.yml` is YAML, anything else tries JSON
    /// first and then YAML.
    pub fn parse(path: &Path, content: &str) -> ConfigResult<Self> {
        let parse_err = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let config: ConfigFile = match ext.as_deref() {
            Some("json") => serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))?
            }
            _ => match serde_json::from_str(content) {
                Ok(config) => config,
                Err(json_err) => serde_yaml::from_str(content).map_err(|yaml_err| {
                    parse_err(format!("not JSON ({}) nor YAML ({})", json_err, yaml_err))
                })?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check server entries and defaults
    pub fn validate(&self) -> ConfigResult<()> {
        self.mcp_servers.validate()?;
        if let Some(defaults) = &self.defaults {
            if defaults.max_tokens == Some(0) {
                return Err(ConfigError::Invalid("defaults.maxTokens must be positive".to_string()));
            }
        }
        Ok(())
    }

    /// Defaults, or an empty set when the file has none
    pub fn defaults(&self) -> DefaultSettings {
        self.defaults.clone().unwrap_or_default()
    }
}

/// Default settings for the chat session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultSettings {
    /// Default provider id (anthropic, groq, openai, mock)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Default model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Override the provider's API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Explicit API key; takes precedence over the environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Config level (user, workspace or explicit path)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLevel {
    /// `<config_dir>/toolrelay/servers.yaml`
    User,
    /// `server_config.json` in the workspace root
    Workspace,
    /// A path given on the command line
    Explicit,
}

impl ConfigLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigLevel::User => "user",
            ConfigLevel::Workspace => "workspace",
            ConfigLevel::Explicit => "explicit",
        }
    }
}

/// File-based configuration provider
///
/// Reads the config once and caches it; `reload()` re-reads from disk.
///
/// # Example
///
/// ```no_run
/// use toolrelay_core::config::FileConfigProvider;
///
/// // ./server_config.json
/// let workspace = FileConfigProvider::workspace(".");
///
/// // ~/.config/toolrelay/servers.yaml
/// let user = FileConfigProvider::user();
/// ```
pub struct FileConfigProvider {
    path: PathBuf,
    level: ConfigLevel,
    cache: RwLock<Option<ConfigFile>>,
}

impl FileConfigProvider {
    /// Create a provider for an explicit path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_level(path, ConfigLevel::Explicit)
    }

    fn with_level(path: impl Into<PathBuf>, level: ConfigLevel) -> Self {
        Self {
            path: path.into(),
            level,
            cache: RwLock::new(None),
        }
    }

    /// Create a user-level config provider (`<config_dir>/toolrelay/servers.yaml`)
    pub fn user() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });
        Self::with_level(config_dir.join("toolrelay").join("servers.yaml"), ConfigLevel::User)
    }

    /// Create a workspace-level config provider (`<root>/server_config.json`)
    pub fn workspace(workspace_root: impl AsRef<Path>) -> Self {
        Self::with_level(
            workspace_root.as_ref().join(WORKSPACE_CONFIG_FILE),
            ConfigLevel::Workspace,
        )
    }

    /// Workspace file when it exists, user file otherwise
    pub fn discover(workspace_root: impl AsRef<Path>) -> Self {
        let workspace = Self::workspace(workspace_root);
        if workspace.exists() {
            workspace
        } else {
            Self::user()
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> ConfigLevel {
        self.level
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read(&self) -> ConfigResult<ConfigFile> {
        if !self.path.exists() {
            return Err(ConfigError::NotFound(self.path.clone()));
        }
        let content = fs::read_to_string(&self.path)?;
        ConfigFile::parse(&self.path, &content)
    }

    /// Get cached or load config
    fn get_config(&self) -> ConfigResult<ConfigFile> {
        if let Some(config) = self.cache.read().as_ref() {
            return Ok(config.clone());
        }
        self.reload()
    }

    /// Reload config from disk (invalidate cache)
    pub fn reload(&self) -> ConfigResult<ConfigFile> {
        let config = self.read()?;
        *self.cache.write() = Some(config.clone());
        Ok(config)
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("level", &self.level)
            .field("exists", &self.exists())
            .finish()
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn load(&self) -> ConfigResult<ConfigFile> {
        self.get_config()
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.path.display(), self.level.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(WORKSPACE_CONFIG_FILE);
        fs::write(
            &path,
            r#"{
                "mcpServers": {
                    "research": { "command": "uv", "args": ["run", "research_server.py"] },
                    "fetch": { "command": "uvx", "args": ["mcp-server-fetch"] }
                }
            }"#,
        )
        .unwrap();

        let provider = FileConfigProvider::workspace(dir.path());
        assert_eq!(provider.level(), ConfigLevel::Workspace);
        let config = provider.load().await.unwrap();
        assert_eq!(config.mcp_servers.names(), vec!["research", "fetch"]);
        assert!(config.defaults.is_none());
    }

    #[tokio::test]
    async fn test_load_yaml_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("servers.yaml");
        fs::write(
            &path,
            "mcpServers:\n  docs:\n    url: http://localhost:9000/mcp\ndefaults:\n  provider: anthropic\n  maxTokens: 1024\n",
        )
        .unwrap();

        let config = FileConfigProvider::new(&path).load().await.unwrap();
        assert_eq!(config.mcp_servers.get("docs"), Some(&ServerConfig::http("http://localhost:9000/mcp")));
        let defaults = config.defaults();
        assert_eq!(defaults.provider.as_deref(), Some("anthropic"));
        assert_eq!(defaults.max_tokens, Some(1024));
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let provider = FileConfigProvider::new(dir.path().join("absent.json"));
        assert!(!provider.exists());
        assert!(matches!(provider.load().await, Err(ConfigError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("server_config.json");
        fs::write(&path, "{ \"mcpServers\": [").unwrap();

        let err = FileConfigProvider::new(&path).load().await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_unknown_extension_falls_back_to_yaml() {
        let config = ConfigFile::parse(
            Path::new("servers.conf"),
            "mcpServers:\n  a:\n    command: echo\n",
        )
        .unwrap();
        assert_eq!(config.mcp_servers.len(), 1);
    }

    #[test]
    fn test_zero_max_tokens_rejected() {
        let result = ConfigFile::parse(
            Path::new("c.json"),
            r#"{ "mcpServers": {}, "defaults": { "maxTokens": 0 } }"#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, r#"{ "mcpServers": { "a": { "command": "x" } } }"#).unwrap();

        let provider = FileConfigProvider::new(&path);
        assert_eq!(provider.get_config().unwrap().mcp_servers.len(), 1);

        fs::write(&path, r#"{ "mcpServers": { "a": { "command": "x" }, "b": { "command": "y" } } }"#)
            .unwrap();
        // Cached until reload
        assert_eq!(provider.get_config().unwrap().mcp_servers.len(), 1);
        assert_eq!(provider.reload().unwrap().mcp_servers.len(), 2);
    }

    #[test]
    fn test_discover_prefers_workspace() {
        let dir = tempdir().unwrap();
        assert_eq!(FileConfigProvider::discover(dir.path()).level(), ConfigLevel::User);

        fs::write(dir.path().join(WORKSPACE_CONFIG_FILE), "{}").unwrap();
        assert_eq!(FileConfigProvider::discover(dir.path()).level(), ConfigLevel::Workspace);
    }
}
