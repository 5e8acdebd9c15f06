//! Tool server session abstraction

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::types::{ToolDescriptor, ToolPayload};

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Session already closed")]
    Closed,
}

pub type McpResult<T> = Result<T, McpError>;

/// A connected handle to one tool server
///
/// `call_tool` reports transport and protocol failures as `Err`. A tool that
/// ran and reported failure in-band comes back as `Ok` with
/// `ToolPayload::is_error` set.
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Configured name of the server behind this session
    fn server_name(&self) -> &str;

    /// Tools the server advertises
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>>;

    /// Invoke a tool; `arguments` is forwarded untouched
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolPayload>;

    /// Release the session; closing twice is a no-op
    async fn close(&self) -> McpResult<()>;
}
