//! Anthropic Messages API adapter
//!
//! A reply is a list of content blocks. Exactly one `text` block is the
//! final answer; any `tool_use` block makes the turn a tool request, with
//! the accompanying text blocks kept as narration.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ProviderError, ProviderResult};
use super::http::post_json;
use super::traits::{Provider, ProviderModelConfig, ProviderTurn, TurnOptions};
use crate::logging::Logger;
use crate::types::{ChatMessage, ContentPart, MessageContent, MessageRole, ToolCall, ToolDescriptor};

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-7-sonnet-20250219";
pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 2024;

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Request<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool<'a>>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct Tool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
    id: Option<String>,
    name: Option<String>,
    input: Option<Value>,
}

// ── Conversion ─────────────────────────────────────────────────────

fn build_messages(messages: &[ChatMessage]) -> Vec<Message> {
    let mut out: Vec<Message> = Vec::new();
    let mut last_was_tool = false;

    for message in messages {
        match message.role {
            MessageRole::Tool => {
                let blocks = message.parts().into_iter().filter_map(|part| match part {
                    ContentPart::ToolResult(result) => Some(ContentBlock::ToolResult {
                        tool_use_id: result.call_id.clone(),
                        content: result.text(),
                        is_error: result.is_error,
                    }),
                    _ => None,
                });
                // Consecutive results travel together in one user message
                match out.last_mut() {
                    Some(previous) if last_was_tool => previous.content.extend(blocks),
                    _ => out.push(Message {
                        role: "user",
                        content: blocks.collect(),
                    }),
                }
                last_was_tool = true;
            }
            MessageRole::User | MessageRole::Assistant => {
                let role = if message.role == MessageRole::User { "user" } else { "assistant" };
                let content = match &message.content {
                    MessageContent::Text(text) => vec![ContentBlock::Text { text: text.clone() }],
                    MessageContent::Parts(parts) => parts
                        .iter()
                        .filter_map(|part| match part {
                            ContentPart::Text { text } if !text.is_empty() => {
                                Some(ContentBlock::Text { text: text.clone() })
                            }
                            ContentPart::ToolUse(call) => Some(ContentBlock::ToolUse {
                                id: call.id.clone(),
                                name: call.name.clone(),
                                input: call.input.clone(),
                            }),
                            _ => None,
                        })
                        .collect(),
                };
                out.push(Message { role, content });
                last_was_tool = false;
            }
        }
    }
    out
}

fn build_request<'a>(
    model: &'a str,
    options: &TurnOptions,
    messages: &[ChatMessage],
    tools: &'a [ToolDescriptor],
) -> Request<'a> {
    Request {
        model,
        max_tokens: options.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
        messages: build_messages(messages),
        temperature: options.temperature,
        tools: tools
            .iter()
            .map(|t| Tool {
                name: &t.name,
                description: &t.description,
                input_schema: &t.input_schema,
            })
            .collect(),
    }
}

fn parse_response(response: Response, logger: &dyn Logger) -> ProviderResult<ProviderTurn> {
    let block_count = response.content.len();
    let mut texts = Vec::new();
    let mut calls = Vec::new();

    for block in response.content {
        match block.block_type.as_str() {
            "text" => texts.push(block.text.unwrap_or_default()),
            "tool_use" => {
                let (Some(id), Some(name)) = (block.id, block.name) else {
                    return Err(ProviderError::invalid_response(
                        "anthropic",
                        "tool_use block without id or name",
                    ));
                };
                let input = block.input.unwrap_or_else(|| Value::Object(Default::default()));
                if !input.is_object() {
                    return Err(ProviderError::invalid_response(
                        "anthropic",
                        format!("tool_use input for '{}' must be a JSON object", name),
                    ));
                }
                calls.push(ToolCall::new(id, name, input));
            }
            other => logger.debug(&format!("[AnthropicProvider] Ignoring '{}' block", other)),
        }
    }

    if !calls.is_empty() {
        return Ok(ProviderTurn::ToolCalls {
            narration: texts.into_iter().filter(|t| !t.is_empty()).collect(),
            calls,
        });
    }

    if block_count == 1 && texts.len() == 1 {
        return Ok(ProviderTurn::Answer(texts.remove(0)));
    }

    logger.warn(&format!(
        "[AnthropicProvider] Reply has {} blocks and no tool_use (stop_reason: {}); joining text",
        block_count,
        response.stop_reason.as_deref().unwrap_or("none")
    ));
    Ok(ProviderTurn::Answer(texts.join("\n")))
}

// ── Provider ───────────────────────────────────────────────────────

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    config: ProviderModelConfig,
    options: TurnOptions,
    client: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl AnthropicProvider {
    /// Create a provider; the config must carry an API key
    pub fn new(
        config: ProviderModelConfig,
        options: TurnOptions,
        logger: Arc<dyn Logger>,
    ) -> ProviderResult<Self> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ProviderError::missing_api_key("anthropic"));
        }
        Ok(Self {
            config,
            options,
            client: reqwest::Client::new(),
            logger,
        })
    }

    fn messages_url(&self) -> String {
        let base = self.config.api_base.as_deref().unwrap_or(ANTHROPIC_API_BASE);
        format!("{}/v1/messages", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_turn(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDescriptor],
    ) -> ProviderResult<ProviderTurn> {
        let body = build_request(&self.config.model, &self.options, messages, tools);
        self.logger.debug(&format!(
            "[AnthropicProvider] POST {} ({} messages, {} tools)",
            self.messages_url(),
            body.messages.len(),
            body.tools.len()
        ));

        let request = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.config.api_key.as_deref().unwrap_or_default())
            .header("anthropic-version", ANTHROPIC_VERSION);
        let response: Response = post_json(request, &body, "anthropic").await?;

        parse_response(response, self.logger.as_ref())
    }
}
