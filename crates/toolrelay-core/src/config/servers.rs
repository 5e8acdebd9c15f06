//! Tool server entries of the config file
//!
//! The `mcpServers` key is a map, but its order matters: servers are
//! registered in file order and a later server wins a tool-name collision.
//! `ServerList` therefore keeps entries as a vector and rejects duplicates
//! instead of silently keeping the last one.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::traits::{ConfigError, ConfigResult};

/// How to reach one tool server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawServer", into = "RawServer")]
pub enum ServerConfig {
    /// Spawn a child process and speak MCP over its stdio
    Stdio {
        command: String,
        args: Vec<String>,
        env: BTreeMap<String, String>,
    },
    /// Connect to a streamable-HTTP MCP endpoint
    Http { url: String },
}

impl ServerConfig {
    /// Create a stdio server entry without extra environment
    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        ServerConfig::Stdio {
            command: command.into(),
            args,
            env: BTreeMap::new(),
        }
    }

    /// Create a streamable-HTTP server entry
    pub fn http(url: impl Into<String>) -> Self {
        ServerConfig::Http { url: url.into() }
    }

    /// Transport name for log lines
    pub fn transport(&self) -> &'static str {
        match self {
            ServerConfig::Stdio { .. } => "stdio",
            ServerConfig::Http { .. } => "http",
        }
    }

    fn validate(&self, name: &str) -> ConfigResult<()> {
        match self {
            ServerConfig::Stdio { command, .. } if command.trim().is_empty() => Err(
                ConfigError::Invalid(format!("server '{}' has an empty command", name)),
            ),
            ServerConfig::Http { url } if url.trim().is_empty() => Err(ConfigError::Invalid(
                format!("server '{}' has an empty url", name),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerConfig::Stdio { command, args, .. } if args.is_empty() => write!(f, "{}", command),
            ServerConfig::Stdio { command, args, .. } => write!(f, "{} {}", command, args.join(" ")),
            ServerConfig::Http { url } => write!(f, "{}", url),
        }
    }
}

/// On-disk shape of a server entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawServer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl TryFrom<RawServer> for ServerConfig {
    type Error = String;

    fn try_from(raw: RawServer) -> Result<Self, Self::Error> {
        match (raw.command, raw.url) {
            (Some(command), None) => Ok(ServerConfig::Stdio {
                command,
                args: raw.args.unwrap_or_default(),
                env: raw.env.unwrap_or_default(),
            }),
            (None, Some(url)) => Ok(ServerConfig::Http { url }),
            (Some(_), Some(_)) => Err("server entry has both `command` and `url`".to_string()),
            (None, None) => Err("server entry needs either `command` or `url`".to_string()),
        }
    }
}

impl From<ServerConfig> for RawServer {
    fn from(config: ServerConfig) -> Self {
        match config {
            ServerConfig::Stdio { command, args, env } => RawServer {
                command: Some(command),
                args: Some(args),
                env: if env.is_empty() { None } else { Some(env) },
                url: None,
            },
            ServerConfig::Http { url } => RawServer {
                url: Some(url),
                ..RawServer::default()
            },
        }
    }
}

/// A server entry with its configured name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedServer {
    pub name: String,
    pub config: ServerConfig,
}

impl NamedServer {
    pub fn new(name: impl Into<String>, config: ServerConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }
}

/// Ordered, duplicate-free list of tool servers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerList(Vec<NamedServer>);

impl ServerList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a server, rejecting a name that is already present
    pub fn push(&mut self, name: impl Into<String>, config: ServerConfig) -> ConfigResult<()> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(ConfigError::Invalid(format!("duplicate server name '{}'", name)));
        }
        self.0.push(NamedServer::new(name, config));
        Ok(())
    }

    /// Builder form of `push` for tests and programmatic setup
    pub fn with(mut self, name: impl Into<String>, config: ServerConfig) -> ConfigResult<Self> {
        self.push(name, config)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&ServerConfig> {
        self.0.iter().find(|s| s.name == name).map(|s| &s.config)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NamedServer> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check every entry for empty names, commands and urls
    pub fn validate(&self) -> ConfigResult<()> {
        for server in &self.0 {
            if server.name.trim().is_empty() {
                return Err(ConfigError::Invalid("server name must not be empty".to_string()));
            }
            server.config.validate(&server.name)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ServerList {
    type Item = &'a NamedServer;
    type IntoIter = std::slice::Iter<'a, NamedServer>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Serialize for ServerList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for server in &self.0 {
            map.serialize_entry(&server.name, &server.config)?;
        }
        map.end()
    }
}

struct ServerListVisitor;

impl<'de> Visitor<'de> for ServerListVisitor {
    type Value = ServerList;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of server name to server config")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut list = ServerList::new();
        while let Some((name, config)) = access.next_entry::<String, ServerConfig>()? {
            list.push(name, config).map_err(serde::de::Error::custom)?;
        }
        Ok(list)
    }

    // `mcpServers: ~` in YAML
    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(ServerList::new())
    }
}

impl<'de> Deserialize<'de> for ServerList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ServerListVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_preserved() {
        let json = r#"{
            "zeta": { "command": "uv", "args": ["run", "zeta.py"] },
            "alpha": { "url": "http://localhost:8001/mcp" },
            "mid": { "command": "npx", "env": { "TOKEN": "x" } }
        }"#;
        let list: ServerList = serde_json::from_str(json).unwrap();
        assert_eq!(list.names(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(list.get("alpha"), Some(&ServerConfig::http("http://localhost:8001/mcp")));
        match list.get("mid") {
            Some(ServerConfig::Stdio { args, env, .. }) => {
                assert!(args.is_empty());
                assert_eq!(env.get("TOKEN").map(String::as_str), Some("x"));
            }
            other => panic!("unexpected entry: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_rejected() {
        let json = r#"{ "a": { "command": "x" }, "a": { "command": "y" } }"#;
        let err = serde_json::from_str::<ServerList>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate server name 'a'"));
    }

    #[test]
    fn test_entry_needs_command_or_url() {
        let err = serde_json::from_str::<ServerList>(r#"{ "a": { "args": [] } }"#).unwrap_err();
        assert!(err.to_string().contains("either `command` or `url`"));

        let both = r#"{ "a": { "command": "x", "url": "http://h" } }"#;
        assert!(serde_json::from_str::<ServerList>(both).is_err());
    }

    #[test]
    fn test_validate_empty_command() {
        let list = ServerList::new().with("blank", ServerConfig::stdio("  ", vec![])).unwrap();
        assert!(matches!(list.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_serialize_as_map() {
        let list = ServerList::new()
            .with("b", ServerConfig::stdio("uv", vec!["run".to_string()]))
            .unwrap()
            .with("a", ServerConfig::http("http://h/mcp"))
            .unwrap();
        let json = serde_json::to_string(&list).unwrap();
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
        assert!(json.contains("\"url\":\"http://h/mcp\""));
        assert!(!json.contains("\"env\""));
    }

    #[test]
    fn test_display() {
        let server = ServerConfig::stdio("uv", vec!["run".to_string(), "research.py".to_string()]);
        assert_eq!(server.to_string(), "uv run research.py");
        assert_eq!(server.transport(), "stdio");
    }
}
