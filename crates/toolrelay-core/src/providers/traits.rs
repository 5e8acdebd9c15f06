//! Provider trait definition

use async_trait::async_trait;

use super::error::ProviderResult;
use crate::types::{ChatMessage, ToolCall, ToolDescriptor};

/// Model configuration for provider requests
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderModelConfig {
    /// Model identifier as used by the provider's API
    pub model: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
}

impl ProviderModelConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_base: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }
}

/// Generation limits applied to every turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOptions {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
}

impl TurnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// What the model did with one turn
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderTurn {
    /// Final textual answer; ends the query
    Answer(String),
    /// The model wants tools run before it answers
    ToolCalls {
        /// Text the model produced alongside the requests
        narration: Vec<String>,
        /// Requests in the order the backend returned them
        calls: Vec<ToolCall>,
    },
}

impl ProviderTurn {
    pub fn answer(text: impl Into<String>) -> Self {
        ProviderTurn::Answer(text.into())
    }

    /// Tool requests without narration
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        ProviderTurn::ToolCalls {
            narration: Vec::new(),
            calls,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProviderTurn::Answer(_))
    }
}

/// Provider trait for LLM backends
///
/// Each backend (Anthropic Messages, OpenAI-compatible Chat Completions)
/// implements this trait. The orchestration loop only ever talks to
/// `dyn Provider`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider id (e.g., "anthropic", "groq")
    fn name(&self) -> &str;

    /// Model used for every turn
    fn model(&self) -> &str;

    /// Send the conversation so far with the tool catalog and interpret the reply
    async fn send_turn(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDescriptor],
    ) -> ProviderResult<ProviderTurn>;
}
