//! Mock provider for testing
//!
//! Provides deterministic, configurable turns without network dependencies.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ProviderError, ProviderResult};
use super::traits::{Provider, ProviderTurn};
use crate::logging::Logger;
use crate::types::{ChatMessage, MessageRole, ToolDescriptor};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    Turn(ProviderTurn),
    /// Fail the turn as an HTTP 503 carrying this message
    Error(String),
}

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Answer with the last user message
    #[default]
    Echo,
    /// Play back replies in order; running out is an error
    Scripted,
}

/// A request the mock received
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDescriptor>,
}

/// Mock LLM provider for testing
pub struct MockProvider {
    mode: MockMode,
    script: Mutex<VecDeque<MockReply>>,
    requests: Mutex<Vec<MockRequest>>,
    logger: Arc<dyn Logger>,
}

impl MockProvider {
    /// Create an echo provider (answers with the user's message)
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self {
            mode: MockMode::Echo,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Create a provider that plays back `replies` in order
    pub fn scripted(replies: Vec<MockReply>, logger: Arc<dyn Logger>) -> Self {
        Self {
            mode: MockMode::Scripted,
            script: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Convenience: script made only of turns
    pub fn with_turns(turns: Vec<ProviderTurn>, logger: Arc<dyn Logger>) -> Self {
        Self::scripted(turns.into_iter().map(MockReply::Turn).collect(), logger)
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    /// Replies not yet played
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }

    fn last_user_message(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .rev()
            .filter(|m| m.role == MessageRole::User)
            .find_map(|m| m.text().filter(|t| !t.is_empty()).map(str::to_string))
            .unwrap_or_else(|| "Hello from MockProvider!".to_string())
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn send_turn(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDescriptor],
    ) -> ProviderResult<ProviderTurn> {
        self.requests.lock().push(MockRequest {
            messages: messages.to_vec(),
            tools: tools.to_vec(),
        });
        self.logger.debug(&format!(
            "[MockProvider] Turn with {} messages and {} tools",
            messages.len(),
            tools.len()
        ));

        match self.mode {
            MockMode::Echo => Ok(ProviderTurn::Answer(Self::last_user_message(messages))),
            MockMode::Scripted => {
                let next = self.script.lock().pop_front();
                match next {
                    Some(MockReply::Turn(turn)) => Ok(turn),
                    Some(MockReply::Error(message)) => Err(ProviderError::status("mock", 503, message)),
                    None => Err(ProviderError::invalid_response("mock", "script exhausted")),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::ToolCall;
    use serde_json::json;

    fn logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    #[tokio::test]
    async fn test_echo() {
        let provider = MockProvider::echo(logger());
        let turn = provider
            .send_turn(&[ChatMessage::user("ping")], &[])
            .await
            .unwrap();
        assert_eq!(turn, ProviderTurn::answer("ping"));
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_script_plays_in_order() {
        let provider = MockProvider::scripted(
            vec![
                MockReply::Turn(ProviderTurn::tool_calls(vec![ToolCall::new("c1", "t", json!({}))])),
                MockReply::Error("overloaded".to_string()),
                MockReply::Turn(ProviderTurn::answer("done")),
            ],
            logger(),
        );
        let tools = vec![ToolDescriptor::new("t", "")];
        let messages = vec![ChatMessage::user("q")];

        assert!(!provider.send_turn(&messages, &tools).await.unwrap().is_terminal());
        assert!(matches!(
            provider.send_turn(&messages, &tools).await,
            Err(ProviderError::Status { status: 503, .. })
        ));
        assert!(provider.send_turn(&messages, &tools).await.unwrap().is_terminal());
        assert!(matches!(
            provider.send_turn(&messages, &tools).await,
            Err(ProviderError::InvalidResponse { message, .. }) if message.contains("exhausted")
        ));

        let requests = provider.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].tools, tools);
        assert_eq!(provider.remaining(), 0);
    }
}
