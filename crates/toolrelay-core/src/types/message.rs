//! Chat message types

use serde::{Deserialize, Serialize};

use super::tool::{ToolCall, ToolResult};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    /// Tool execution result fed back to the model
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// A provider-neutral chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender
    pub role: MessageRole,
    /// The content of the message (string or structured parts)
    pub content: MessageContent,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create an assistant turn that requests tool calls
    ///
    /// Narration comes first, followed by one tool-use part per call in
    /// the order the backend returned them.
    pub fn assistant_tool_calls(narration: &[String], calls: &[ToolCall]) -> Self {
        let mut parts: Vec<ContentPart> = narration.iter().map(ContentPart::text).collect();
        parts.extend(calls.iter().cloned().map(ContentPart::ToolUse));
        Self::with_parts(MessageRole::Assistant, parts)
    }

    /// Create a tool result message
    pub fn tool_result(result: ToolResult) -> Self {
        Self::with_parts(MessageRole::Tool, vec![ContentPart::ToolResult(result)])
    }

    /// Create a message with structured content parts
    pub fn with_parts(role: MessageRole, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: MessageContent::Parts(parts),
        }
    }

    /// Get the text content if this is a simple text message
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(s) => Some(s),
            MessageContent::Parts(_) => None,
        }
    }

    /// Content parts; a plain text message yields a single text part
    pub fn parts(&self) -> Vec<ContentPart> {
        match &self.content {
            MessageContent::Text(text) => vec![ContentPart::text(text)],
            MessageContent::Parts(parts) => parts.clone(),
        }
    }

    /// Tool calls requested in this message
    pub fn tool_calls(&self) -> Vec<&ToolCall> {
        match &self.content {
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::ToolUse(call) => Some(call),
                    _ => None,
                })
                .collect(),
            MessageContent::Text(_) => Vec::new(),
        }
    }

    /// The tool result carried by this message, if any
    pub fn as_tool_result(&self) -> Option<&ToolResult> {
        match &self.content {
            MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::ToolResult(result) => Some(result),
                _ => None,
            }),
            MessageContent::Text(_) => None,
        }
    }
}

/// Message content - either simple text or structured parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Structured content with multiple parts
    Parts(Vec<ContentPart>),
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        MessageContent::Parts(parts)
    }
}

/// Content part for assistant turns and tool results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content
    Text {
        text: String,
    },
    /// Tool use (assistant calling a tool)
    ToolUse(ToolCall),
    /// Tool result (returning tool output)
    ToolResult(ToolResult),
}

impl ContentPart {
    /// Create a text content part
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolPayload;
    use serde_json::json;

    #[test]
    fn test_chat_message_creation() {
        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, MessageRole::User);
        assert_eq!(user.text(), Some("Hello"));

        let asst = ChatMessage::assistant("Hi there!");
        assert_eq!(asst.role, MessageRole::Assistant);
    }

    #[test]
    fn test_assistant_tool_calls_order() {
        let calls = vec![
            ToolCall::new("a", "first", json!({})),
            ToolCall::new("b", "second", json!({})),
        ];
        let msg = ChatMessage::assistant_tool_calls(&["thinking".to_string()], &calls);
        let parts = msg.parts();
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], ContentPart::Text { text } if text == "thinking"));
        let ids: Vec<_> = msg.tool_calls().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_tool_result_message() {
        let call = ToolCall::new("a", "first", json!({}));
        let msg = ChatMessage::tool_result(ToolResult::for_call(&call, ToolPayload::text("done")));
        assert_eq!(msg.role, MessageRole::Tool);
        assert_eq!(msg.as_tool_result().map(|r| r.call_id.as_str()), Some("a"));
        assert!(msg.text().is_none());
    }

    #[test]
    fn test_message_serialization() {
        let msg = ChatMessage::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        assert!(json.contains("\"content\":\"Hello\""));
    }

    #[test]
    fn test_content_part_serialization() {
        let part = ContentPart::ToolUse(ToolCall::new("id1", "echo", json!({ "x": 1 })));
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "tool_use");
        assert_eq!(json["name"], "echo");
    }
}
