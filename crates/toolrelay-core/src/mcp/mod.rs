//! MCP (Model Context Protocol) tool sessions
//!
//! `ToolSession` is the seam between the orchestration loop and a tool
//! server. `McpClient` implements it with the official rmcp SDK over stdio
//! child processes or streamable HTTP; `MockToolSession` implements it in
//! memory.
//!
//! # Example
//!
//! ```rust,ignore
//! use toolrelay_core::mcp::{McpClient, ToolSession};
//! use std::sync::Arc;
//!
//! let logger: Arc<dyn Logger> = Arc::new(NoOpLogger::new());
//! let client = McpClient::connect_stdio(
//!     "research", "uv", &["run".into(), "research_server.py".into()], &Default::default(), logger,
//! ).await?;
//!
//! let tools = client.list_tools().await?;
//! let result = client.call_tool("search_papers", json!({ "topic": "physics" })).await?;
//! client.close().await?;
//! ```

mod session;
mod client;
mod mock;

pub use session::{ToolSession, McpError, McpResult};
pub use client::{McpClient, arguments_object, descriptor_from_tool, output_from_content, payload_from_result};
pub use mock::{MockToolSession, MockToolBehavior};
