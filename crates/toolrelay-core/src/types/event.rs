//! Progress events emitted while a query is processed

use serde::{Deserialize, Serialize};
use super::tool::{ToolCall, ToolResult};

/// Something observable that happened during a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Text the model produced alongside tool requests
    Narration {
        text: String,
    },
    /// A tool is about to be invoked
    ToolCall {
        #[serde(rename = "toolCall")]
        tool_call: ToolCall,
    },
    /// A tool finished and its result was appended
    ToolResult {
        #[serde(rename = "toolResult")]
        tool_result: ToolResult,
    },
    /// The terminal answer
    Answer {
        text: String,
    },
}

impl AgentEvent {
    /// Create a narration event
    pub fn narration(text: impl Into<String>) -> Self {
        AgentEvent::Narration { text: text.into() }
    }

    /// Create an answer event
    pub fn answer(text: impl Into<String>) -> Self {
        AgentEvent::Answer { text: text.into() }
    }

    /// Check if this is the terminal answer
    pub fn is_answer(&self) -> bool {
        matches!(self, AgentEvent::Answer { .. })
    }

    /// Get the text if this is a narration or answer event
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AgentEvent::Narration { text } | AgentEvent::Answer { text } => Some(text),
            _ => None,
        }
    }

    /// Get the tool call if this is a tool call event
    pub fn as_tool_call(&self) -> Option<&ToolCall> {
        match self {
            AgentEvent::ToolCall { tool_call } => Some(tool_call),
            _ => None,
        }
    }
}
