//! OpenAI-compatible Chat Completions adapter
//!
//! Serves Groq (the default endpoint), OpenAI and any other server that
//! speaks the same wire format. A reply is a single message: a non-empty
//! `tool_calls` list makes it a tool request, otherwise `content` is the
//! answer.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ProviderError, ProviderResult};
use super::http::post_json;
use super::traits::{Provider, ProviderModelConfig, ProviderTurn, TurnOptions};
use crate::logging::Logger;
use crate::types::{ChatMessage, ContentPart, MessageContent, MessageRole, ToolCall, ToolDescriptor};

pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const GROQ_DEFAULT_MODEL: &str = "openai/gpt-oss-20b";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const OPENAI_DEFAULT_MAX_TOKENS: u32 = 4096;

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Request<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCallRequest>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl Message {
    fn text(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ToolCallRequest {
    id: String,
    #[serde(rename = "type")]
    call_type: &'static str,
    function: FunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    /// JSON string of the arguments
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Serialize)]
struct Tool<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: FunctionDef<'a>,
}

#[derive(Debug, Serialize)]
struct FunctionDef<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallResponse>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallResponse {
    id: String,
    function: FunctionCall,
}

// ── Conversion ─────────────────────────────────────────────────────

fn build_message(message: &ChatMessage) -> Vec<Message> {
    match (message.role, &message.content) {
        (MessageRole::User, _) => vec![Message::text("user", plain_text(message))],
        (MessageRole::Assistant, MessageContent::Text(text)) => {
            vec![Message::text("assistant", text.clone())]
        }
        (MessageRole::Assistant, MessageContent::Parts(parts)) => {
            let narration: Vec<&str> = parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } if !text.is_empty() => Some(text.as_str()),
                    _ => None,
                })
                .collect();
            let tool_calls: Vec<ToolCallRequest> = message
                .tool_calls()
                .into_iter()
                .map(|call| ToolCallRequest {
                    id: call.id.clone(),
                    call_type: "function",
                    function: FunctionCall {
                        name: call.name.clone(),
                        arguments: call.input.to_string(),
                    },
                })
                .collect();
            vec![Message {
                role: "assistant",
                content: if narration.is_empty() { None } else { Some(narration.join("\n")) },
                tool_calls: if tool_calls.is_empty() { None } else { Some(tool_calls) },
                tool_call_id: None,
                name: None,
            }]
        }
        // One `tool` message per result
        (MessageRole::Tool, _) => message
            .parts()
            .into_iter()
            .filter_map(|part| match part {
                ContentPart::ToolResult(result) => Some(Message {
                    role: "tool",
                    content: Some(result.text()),
                    tool_calls: None,
                    tool_call_id: Some(result.call_id.clone()),
                    name: Some(result.name.clone()),
                }),
                _ => None,
            })
            .collect(),
    }
}

fn plain_text(message: &ChatMessage) -> String {
    match &message.content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn build_request<'a>(
    model: &'a str,
    options: &TurnOptions,
    messages: &[ChatMessage],
    tools: &'a [ToolDescriptor],
) -> Request<'a> {
    Request {
        model,
        messages: messages.iter().flat_map(build_message).collect(),
        max_completion_tokens: options.max_tokens,
        temperature: options.temperature,
        tools: tools
            .iter()
            .map(|t| Tool {
                tool_type: "function",
                function: FunctionDef {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.input_schema,
                },
            })
            .collect(),
        tool_choice: if tools.is_empty() { None } else { Some("auto") },
    }
}

/// Parse a function-arguments string; empty means no arguments
///
/// Tool arguments must be a JSON object. Anything else fails the turn
/// rather than reaching the tool server as "no arguments".
fn parse_arguments(provider: &str, raw: &str) -> ProviderResult<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        ProviderError::invalid_response(provider, format!("tool arguments are not JSON: {}", e))
    })?;
    if !value.is_object() {
        return Err(ProviderError::invalid_response(
            provider,
            format!("tool arguments must be a JSON object, got {}", raw.trim()),
        ));
    }
    Ok(value)
}

fn parse_response(provider: &str, response: Response) -> ProviderResult<ProviderTurn> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::invalid_response(provider, "no choices in response"))?;
    let message = choice.message;

    match message.tool_calls {
        Some(tool_calls) if !tool_calls.is_empty() => {
            let calls = tool_calls
                .into_iter()
                .map(|tc| {
                    let input = parse_arguments(provider, &tc.function.arguments)?;
                    Ok(ToolCall::new(tc.id, tc.function.name, input))
                })
                .collect::<ProviderResult<Vec<_>>>()?;
            let narration = message
                .content
                .filter(|c| !c.trim().is_empty())
                .into_iter()
                .collect();
            Ok(ProviderTurn::ToolCalls { narration, calls })
        }
        _ => Ok(ProviderTurn::Answer(message.content.unwrap_or_default())),
    }
}

// ── Provider ───────────────────────────────────────────────────────

/// Chat Completions provider for OpenAI-compatible endpoints
pub struct OpenAiProvider {
    id: String,
    config: ProviderModelConfig,
    options: TurnOptions,
    client: reqwest::Client,
    logger: Arc<dyn Logger>,
}

impl OpenAiProvider {
    /// Create a provider under `id`; the config must carry an API key
    pub fn new(
        id: impl Into<String>,
        config: ProviderModelConfig,
        options: TurnOptions,
        logger: Arc<dyn Logger>,
    ) -> ProviderResult<Self> {
        let id = id.into();
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ProviderError::missing_api_key(id));
        }
        Ok(Self {
            id,
            config,
            options,
            client: reqwest::Client::new(),
            logger,
        })
    }

    /// Groq endpoint
    pub fn groq(config: ProviderModelConfig, options: TurnOptions, logger: Arc<dyn Logger>) -> ProviderResult<Self> {
        Self::new("groq", config, options, logger)
    }

    /// Default API base URL for this provider id
    pub fn default_api_base(&self) -> &str {
        match self.id.as_str() {
            "openai" => OPENAI_API_BASE,
            _ => GROQ_API_BASE,
        }
    }

    fn completions_url(&self) -> String {
        let base = self
            .config
            .api_base
            .as_deref()
            .unwrap_or_else(|| self.default_api_base());
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.id
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
            "[OpenAiProvider] POST {} ({} messages, {} tools)",
            self.completions_url(),
            body.messages.len(),
            body.tools.len()
        ));

        let request = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key.as_deref().unwrap_or_default());
        let response: Response = post_json(request, &body, &self.id).await?;

        parse_response(&self.id, response)
    }
}
