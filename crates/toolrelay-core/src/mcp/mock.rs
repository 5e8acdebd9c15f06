//! In-memory tool session for tests and offline runs

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::session::{McpError, McpResult, ToolSession};
use crate::types::{ToolDescriptor, ToolPayload};

/// What a mock tool does when called
#[derive(Debug, Clone)]
pub enum MockToolBehavior {
    /// Return the arguments back as JSON text
    Echo,
    /// Return this payload every time
    Reply(ToolPayload),
    /// Fail at the session level
    Fail(String),
}

/// Mock tool session for testing
///
/// Tools are static. Each call first consumes a queued response for that
/// tool, if any, then falls back to the tool's behavior. Every call is
/// recorded.
#[derive(Debug)]
pub struct MockToolSession {
    name: String,
    tools: Vec<ToolDescriptor>,
    behaviors: HashMap<String, MockToolBehavior>,
    queued: Mutex<HashMap<String, VecDeque<MockToolBehavior>>>,
    calls: Mutex<Vec<(String, Value)>>,
    list_error: Option<String>,
    close_error: Option<String>,
    close_count: AtomicUsize,
}

impl MockToolSession {
    /// Create a session with no tools
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: Vec::new(),
            behaviors: HashMap::new(),
            queued: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            list_error: None,
            close_error: None,
            close_count: AtomicUsize::new(0),
        }
    }

    /// Add a tool that echoes its arguments
    pub fn with_tool(self, descriptor: ToolDescriptor) -> Self {
        self.with_tool_behavior(descriptor, MockToolBehavior::Echo)
    }

    /// Add a tool that always returns `text`
    pub fn with_text_tool(self, name: &str, text: &str) -> Self {
        self.with_tool_behavior(
            ToolDescriptor::new(name, format!("{} tool", name)),
            MockToolBehavior::Reply(ToolPayload::text(text)),
        )
    }

    /// Add a tool with an explicit behavior
    pub fn with_tool_behavior(mut self, descriptor: ToolDescriptor, behavior: MockToolBehavior) -> Self {
        self.behaviors.insert(descriptor.name.clone(), behavior);
        self.tools.push(descriptor);
        self
    }

    /// Make `list_tools` fail
    pub fn with_list_error(mut self, message: impl Into<String>) -> Self {
        self.list_error = Some(message.into());
        self
    }

    /// Make `close` fail (it still counts as closed)
    pub fn with_close_error(mut self, message: impl Into<String>) -> Self {
        self.close_error = Some(message.into());
        self
    }

    /// Queue a one-shot response for the next call of `tool`
    pub fn queue(&self, tool: &str, behavior: MockToolBehavior) {
        self.queued
            .lock()
            .entry(tool.to_string())
            .or_default()
            .push_back(behavior);
    }

    /// Calls received so far, as (tool name, arguments)
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// How many times `close` has been called
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolSession for MockToolSession {
    fn server_name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        match &self.list_error {
            Some(message) => Err(McpError::Protocol(message.clone())),
            None => Ok(self.tools.clone()),
        }
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolPayload> {
        self.calls.lock().push((name.to_string(), arguments.clone()));

        let queued = self
            .queued
            .lock()
            .get_mut(name)
            .and_then(VecDeque::pop_front);
        let behavior = match queued {
            Some(behavior) => behavior,
            None => self
                .behaviors
                .get(name)
                .cloned()
                .ok_or_else(|| McpError::ToolCallFailed(format!("Unknown tool: {}", name)))?,
        };

        match behavior {
            MockToolBehavior::Echo => Ok(ToolPayload::text(arguments.to_string())),
            MockToolBehavior::Reply(payload) => Ok(payload),
            MockToolBehavior::Fail(message) => Err(McpError::ToolCallFailed(message)),
        }
    }

    async fn close(&self) -> McpResult<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        match &self.close_error {
            Some(message) => Err(McpError::Protocol(message.clone())),
            None => Ok(()),
        }
    }
}
