//! toolrelay core
//!
//! Connects to any number of MCP tool servers, merges their tools into a
//! single catalog, and runs a chat loop in which an LLM backend may call
//! those tools across several rounds before it answers.
//!
//! ## Orchestration
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toolrelay_core::{
//!     Agent, ConsoleLogger, FileConfigProvider, ConfigProvider, ProviderSettings,
//!     SessionManager, ToolRegistry, create_provider,
//! };
//!
//! let logger = Arc::new(ConsoleLogger::new());
//! let config = FileConfigProvider::discover(".").load().await?;
//!
//! let mut registry = ToolRegistry::new(logger.clone());
//! let sessions = SessionManager::mcp(logger.clone());
//! sessions.connect_all(&config.mcp_servers, &mut registry).await;
//!
//! let settings = ProviderSettings::resolve(&Default::default(), &config.defaults())?;
//! let provider = create_provider(&settings, logger.clone())?;
//!
//! let agent = Agent::new(provider, Arc::new(registry), logger);
//! let outcome = agent.process_query("Find two papers on diffusion models").await?;
//! println!("{}", outcome.answer);
//!
//! sessions.teardown().await;
//! ```

pub mod types;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod providers;
pub mod mcp;
pub mod tools;
pub mod sessions;
pub mod agent;
pub mod error;

// Re-export commonly used types
pub use types::{
    AgentEvent, ChatMessage, ContentPart, Conversation, MessageContent, MessageRole,
    ToolCall, ToolDescriptor, ToolOutput, ToolPayload, ToolResult,
};

pub use secrets::{
    SecretStore, SecretStoreError, SecretStoreResult,
    EnvSecretStore, DotenvSecretStore, MemorySecretStore, ChainSecretStore,
    default_chain,
};

pub use logging::{Logger, LogLevel, NoOpLogger, ConsoleLogger, FileLogger};

pub use config::{
    ConfigProvider, ConfigError, ConfigResult, ConfigFile, DefaultSettings,
    FileConfigProvider, MemoryConfigProvider, ServerConfig, ServerList,
};

pub use providers::{
    Provider, ProviderError, ProviderResult, ProviderSettings, ProviderTurn,
    SettingsOverrides, create_provider,
};

// MCP client using official rmcp SDK
pub use mcp::{McpClient, McpError, McpResult, ToolSession};

pub use tools::ToolRegistry;
pub use sessions::{ConnectReport, SessionManager, TeardownReport};
pub use agent::{Agent, QueryOutcome};
pub use error::{AgentError, AgentResult};
