//! Errors surfaced by the orchestration layer

use thiserror::Error;

use crate::config::ConfigError;
use crate::mcp::McpError;
use crate::providers::ProviderError;

/// Everything that can go wrong between startup and a finished query
#[derive(Error, Debug)]
pub enum AgentError {
    /// Config unreadable/malformed or provider unusable; fatal at startup
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// One server failed to launch, initialize or list its tools
    #[error("Failed to connect to {server}: {source}")]
    ServerConnection {
        server: String,
        #[source]
        source: McpError,
    },

    /// The model asked for a tool nobody registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The owning session failed to run a tool call
    #[error("Tool '{tool}' failed: {source}")]
    ToolExecution {
        tool: String,
        #[source]
        source: McpError,
    },

    /// The LLM backend call failed
    #[error("Backend request failed: {0}")]
    BackendRequest(#[from] ProviderError),
}

pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AgentError::ServerConnection {
            server: "research".to_string(),
            source: McpError::ConnectionFailed("spawn 'uv': not found".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to connect to research: Connection failed: spawn 'uv': not found"
        );
        assert_eq!(AgentError::UnknownTool("x".to_string()).to_string(), "Unknown tool: x");
    }

    #[test]
    fn test_from_conversions() {
        let err: AgentError = ProviderError::missing_api_key("groq").into();
        assert!(matches!(err, AgentError::BackendRequest(_)));

        let err: AgentError = ConfigError::Invalid("bad".to_string()).into();
        assert!(matches!(err, AgentError::Configuration(_)));
    }
}
