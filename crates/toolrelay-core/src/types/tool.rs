//! Tool descriptor, invocation and result types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A callable function advertised by a tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name (unique within a registry)
    pub name: String,
    /// Human-readable description shown to the model
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Create a descriptor with an empty object schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: serde_json::json!({ "type": "object", "properties": {} }),
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Correlation id assigned by the backend
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Input arguments, passed to the tool server untouched
    pub input: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// One piece of tool output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolOutput {
    /// Plain text
    Text { text: String },
    /// Base64 image data
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// Any other content, kept as raw JSON
    Json { value: Value },
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        ToolOutput::Text { text: text.into() }
    }

    /// Render this output as plain text for backends that only accept strings
    pub fn to_text(&self) -> String {
        match self {
            ToolOutput::Text { text } => text.clone(),
            ToolOutput::Image { mime_type, data } => {
                format!("[image {} ({} bytes base64)]", mime_type, data.len())
            }
            ToolOutput::Json { value } => value.to_string(),
        }
    }
}

/// What a tool server returned for one call, before correlation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolPayload {
    pub content: Vec<ToolOutput>,
    /// Set when the server reported the call as failed in-band
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolPayload {
    /// A successful payload with a single text part
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolOutput::text(text)],
            is_error: false,
        }
    }

    /// An in-band error payload with a single text part
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolOutput::text(text)],
            is_error: true,
        }
    }
}

/// Tool result correlated back to the invocation that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is responding to
    #[serde(rename = "callId")]
    pub call_id: String,
    /// Name of the tool that ran
    pub name: String,
    /// Result content parts
    pub content: Vec<ToolOutput>,
    /// Whether this result represents an error
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Correlate a server payload with the call that requested it
    pub fn for_call(call: &ToolCall, payload: ToolPayload) -> Self {
        Self {
            call_id: call.id.clone(),
            name: call.name.clone(),
            content: payload.content,
            is_error: payload.is_error,
        }
    }

    /// All content parts flattened to text, one per line
    pub fn text(&self) -> String {
        self.content
            .iter()
            .map(ToolOutput::to_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
