//! MCP client using the official rmcp SDK
//!
//! Connects to MCP servers over a child process's stdio or streamable HTTP.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Content,
        Implementation, RawContent, Tool,
    },
    service::{Peer, RunningService},
    RoleClient, ServiceExt,
};
use serde_json::{Map, Value};

use super::session::{McpError, McpResult, ToolSession};
use crate::config::ServerConfig;
use crate::logging::Logger;
use crate::types::{ToolDescriptor, ToolOutput, ToolPayload};

/// MCP client for one configured tool server
pub struct McpClient {
    /// Configured server name
    name: String,
    /// Request handle, cloned from the running service
    peer: Peer<RoleClient>,
    /// The underlying rmcp running service; taken on close
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    closed: AtomicBool,
    logger: Arc<dyn Logger>,
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "toolrelay".to_string(),
            title: Some("toolrelay".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

impl McpClient {
    /// Connect using whichever transport the config names
    pub async fn connect(
        name: &str,
        config: &ServerConfig,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        match config {
            ServerConfig::Stdio { command, args, env } => {
                Self::connect_stdio(name, command, args, env, logger).await
            }
            ServerConfig::Http { url } => Self::connect_http(name, url, logger).await,
        }
    }

    /// Spawn a server process and speak MCP over its stdio
    ///
    /// The child's stderr is inherited so server diagnostics stay visible.
    pub async fn connect_stdio(
        name: &str,
        command: &str,
        args: &[String],
        env: &BTreeMap<String, String>,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};

        logger.info(&format!(
            "[McpClient] Launching '{}': {} {}",
            name,
            command,
            args.join(" ")
        ));

        let transport = TokioChildProcess::new(tokio::process::Command::new(command).configure(
            |cmd| {
                cmd.args(args).envs(env.iter()).stderr(Stdio::inherit());
            },
        ))
        .map_err(|e| McpError::ConnectionFailed(format!("spawn '{}': {}", command, e)))?;

        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        Ok(Self::from_service(name, service, logger))
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(name: &str, url: &str, logger: Arc<dyn Logger>) -> McpResult<Self> {
        use rmcp::transport::StreamableHttpClientTransport;

        logger.info(&format!("[McpClient] Connecting '{}' over HTTP: {}", name, url));

        let transport = StreamableHttpClientTransport::from_uri(url);

        let service = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        Ok(Self::from_service(name, service, logger))
    }

    fn from_service(
        name: &str,
        service: RunningService<RoleClient, ClientInfo>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let client = Self {
            name: name.to_string(),
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            closed: AtomicBool::new(false),
            logger,
        };
        client.logger.info(&format!(
            "[McpClient] '{}' initialized (server: {})",
            client.name,
            client
                .server_info()
                .map(|i| format!("{} {}", i.name, i.version))
                .unwrap_or_else(|| "unknown".to_string())
        ));
        client
    }

    /// Get server info reported during initialization
    pub fn server_info(&self) -> Option<&Implementation> {
        self.peer.peer_info().map(|info| &info.server_info)
    }

    fn ensure_open(&self) -> McpResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(McpError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ToolSession for McpClient {
    fn server_name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        self.ensure_open()?;
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.info(&format!(
            "[McpClient] '{}' listed {} tools",
            self.name,
            tools.len()
        ));

        Ok(tools.into_iter().map(descriptor_from_tool).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolPayload> {
        self.ensure_open()?;
        self.logger
            .debug(&format!("[McpClient] '{}' calling tool: {}", self.name, name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments_object(name, arguments)?,
            task: None,
        };

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))?;

        Ok(payload_from_result(result))
    }

    async fn close(&self) -> McpResult<()> {
        let service = self.service.lock().take();
        let Some(service) = service else {
            return Ok(());
        };
        self.closed.store(true, Ordering::Release);

        self.logger
            .info(&format!("[McpClient] Closing connection to '{}'", self.name));
        service
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

impl std::fmt::Debug for McpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpClient")
            .field("name", &self.name)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

/// Tool arguments as the object MCP expects; `null` means none
pub fn arguments_object(tool: &str, arguments: Value) -> McpResult<Option<Map<String, Value>>> {
    match arguments {
        Value::Object(map) => Ok(Some(map)),
        Value::Null => Ok(None),
        other => Err(McpError::ToolCallFailed(format!(
            "arguments for '{}' must be a JSON object, got {}",
            tool, other
        ))),
    }
}

/// Convert an rmcp tool into a provider-neutral descriptor
pub fn descriptor_from_tool(tool: Tool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
        input_schema: Value::Object((*tool.input_schema).clone()),
    }
}

/// Convert one content item of a tool result
pub fn output_from_content(content: &Content) -> ToolOutput {
    // Content is Annotated<RawContent>; .raw holds the payload
    match &content.raw {
        RawContent::Text(t) => ToolOutput::text(t.text.clone()),
        RawContent::Image(image) => ToolOutput::Image {
            data: image.data.clone(),
            mime_type: image.mime_type.clone(),
        },
        other => ToolOutput::Json {
            value: serde_json::to_value(other).unwrap_or(Value::Null),
        },
    }
}

/// Convert an rmcp call result into a payload
pub fn payload_from_result(result: CallToolResult) -> ToolPayload {
    ToolPayload {
        content: result.content.iter().map(output_from_content).collect(),
        is_error: result.is_error.unwrap_or(false),
    }
}
