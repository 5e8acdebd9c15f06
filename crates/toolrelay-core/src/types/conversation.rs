//! Per-query conversation transcript

use serde::{Deserialize, Serialize};

use super::message::{ChatMessage, MessageRole};
use super::tool::{ToolCall, ToolResult};

/// Append-only transcript for a single query
///
/// Always starts with exactly one user message. Nothing is ever removed or
/// rewritten; a new `Conversation` is built for every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Seed a conversation with the user's query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(query)],
        }
    }

    /// Record an assistant turn that requested tools
    pub fn push_tool_request(&mut self, narration: &[String], calls: &[ToolCall]) {
        self.messages
            .push(ChatMessage::assistant_tool_calls(narration, calls));
    }

    /// Record a tool result
    pub fn push_tool_result(&mut self, result: ToolResult) {
        self.messages.push(ChatMessage::tool_result(result));
    }

    /// Record the terminal assistant answer
    pub fn push_answer(&mut self, answer: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(answer));
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Tool results in the order they were appended
    pub fn tool_results(&self) -> Vec<&ToolResult> {
        self.messages
            .iter()
            .filter(|m| m.role == MessageRole::Tool)
            .filter_map(ChatMessage::as_tool_result)
            .collect()
    }
}
