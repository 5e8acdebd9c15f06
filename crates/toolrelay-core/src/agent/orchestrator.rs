//! Multi-turn tool orchestration loop
//!
//! ```text
//!   AwaitingModel ──Answer──────> Terminal
//!        ▲   │
//!        │   └──ToolCalls──> DispatchingTools
//!        └───────────────────────────┘
//! ```

use std::sync::Arc;

use crate::error::{AgentError, AgentResult};
use crate::logging::Logger;
use crate::providers::{Provider, ProviderTurn};
use crate::tools::ToolRegistry;
use crate::types::{AgentEvent, Conversation, ToolCall, ToolResult};

/// Result of a processed query
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// The terminal answer
    pub answer: String,
    /// The full transcript, ending with the answer
    pub conversation: Conversation,
    /// How many times tools were dispatched
    pub tool_rounds: usize,
}

enum LoopState {
    AwaitingModel,
    DispatchingTools(Vec<ToolCall>),
    Terminal(String),
}

/// Drives a query from the user's question to the model's final answer
pub struct Agent {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    logger: Arc<dyn Logger>,
}

impl Agent {
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<ToolRegistry>, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider,
            registry,
            logger,
        }
    }

    /// Process one query without observing progress
    pub async fn process_query(&self, query: &str) -> AgentResult<QueryOutcome> {
        self.process_query_with(query, |_| {}).await
    }

    /// Process one query, reporting each step to `on_event` as it happens
    ///
    /// The conversation is created here and dropped on error. A tool that
    /// reports failure in-band is not an error: its result goes back to
    /// the model flagged `is_error`.
    pub async fn process_query_with<F>(&self, query: &str, mut on_event: F) -> AgentResult<QueryOutcome>
    where
        F: FnMut(&AgentEvent) + Send,
    {
        let catalog = self.registry.catalog();
        let mut conversation = Conversation::new(query);
        let mut tool_rounds = 0;
        let mut state = LoopState::AwaitingModel;

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    let turn = self
                        .provider
                        .send_turn(conversation.messages(), catalog)
                        .await?;
                    match turn {
                        ProviderTurn::Answer(text) => LoopState::Terminal(text),
                        ProviderTurn::ToolCalls { narration, calls } => {
                            for text in &narration {
                                on_event(&AgentEvent::narration(text.clone()));
                            }
                            conversation.push_tool_request(&narration, &calls);
                            LoopState::DispatchingTools(calls)
                        }
                    }
                }
                LoopState::DispatchingTools(calls) => {
                    tool_rounds += 1;
                    self.logger.debug(&format!(
                        "[Agent] Round {}: dispatching {} tool calls",
                        tool_rounds,
                        calls.len()
                    ));
                    for call in calls {
                        on_event(&AgentEvent::ToolCall {
                            tool_call: call.clone(),
                        });
                        let result = self.dispatch(&call).await?;
                        on_event(&AgentEvent::ToolResult {
                            tool_result: result.clone(),
                        });
                        conversation.push_tool_result(result);
                    }
                    LoopState::AwaitingModel
                }
                LoopState::Terminal(answer) => {
                    on_event(&AgentEvent::answer(answer.clone()));
                    conversation.push_answer(answer.clone());
                    return Ok(QueryOutcome {
                        answer,
                        conversation,
                        tool_rounds,
                    });
                }
            };
        }
    }

    async fn dispatch(&self, call: &ToolCall) -> AgentResult<ToolResult> {
        let session = self.registry.resolve(&call.name)?;
        self.logger.info(&format!(
            "[Agent] Calling tool {} on '{}' with args {}",
            call.name,
            session.server_name(),
            call.input
        ));

        let payload = session
            .call_tool(&call.name, call.input.clone())
            .await
            .map_err(|source| AgentError::ToolExecution {
                tool: call.name.clone(),
                source,
            })?;

        if payload.is_error {
            self.logger
                .warn(&format!("[Agent] Tool {} reported an error", call.name));
        }
        Ok(ToolResult::for_call(call, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::mcp::{MockToolBehavior, MockToolSession, ToolSession};
    use crate::providers::{MockProvider, MockReply};
    use crate::types::{MessageRole, ToolDescriptor, ToolPayload};
    use serde_json::json;

    fn logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    fn registry_with(session: Arc<MockToolSession>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new(logger());
        let tools = futures::executor::block_on(session.list_tools()).unwrap();
        registry.register(session, tools);
        Arc::new(registry)
    }

    fn search_session() -> Arc<MockToolSession> {
        Arc::new(
            MockToolSession::new("research")
                .with_tool(ToolDescriptor::new("search_papers", "Search arXiv"))
                .with_text_tool("extract_info", "paper details"),
        )
    }

    fn call(id: &str, name: &str, input: serde_json::Value) -> ToolCall {
        ToolCall::new(id, name, input)
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let provider = Arc::new(MockProvider::with_turns(vec![ProviderTurn::answer("42")], logger()));
        let agent = Agent::new(provider.clone(), registry_with(search_session()), logger());

        let outcome = agent.process_query("meaning?").await.unwrap();
        assert_eq!(outcome.answer, "42");
        assert_eq!(outcome.tool_rounds, 0);
        assert_eq!(outcome.conversation.len(), 2);
        assert_eq!(provider.requests()[0].tools.len(), 2);
    }

    #[tokio::test]
    async fn test_converges_after_k_rounds() {
        for k in 0..4 {
            let mut turns: Vec<ProviderTurn> = (0..k)
                .map(|i| ProviderTurn::tool_calls(vec![call(&format!("c{}", i), "extract_info", json!({ "i": i }))]))
                .collect();
            turns.push(ProviderTurn::answer("done"));
            let provider = Arc::new(MockProvider::with_turns(turns, logger()));
            let agent = Agent::new(provider.clone(), registry_with(search_session()), logger());

            let outcome = agent.process_query("q").await.unwrap();
            assert_eq!(outcome.tool_rounds, k);
            assert_eq!(provider.requests().len(), k + 1);
            // user + k * (assistant + tool) + answer
            assert_eq!(outcome.conversation.len(), 2 + 2 * k);
        }
    }

    #[tokio::test]
    async fn test_invocation_order_and_correlation() {
        let session = search_session();
        let provider = Arc::new(MockProvider::with_turns(
            vec![
                ProviderTurn::ToolCalls {
                    narration: vec!["Checking two things".to_string()],
                    calls: vec![
                        call("id_b", "search_papers", json!({ "topic": "b" })),
                        call("id_a", "search_papers", json!({ "topic": "a" })),
                    ],
                },
                ProviderTurn::answer("ok"),
            ],
            logger(),
        ));
        let agent = Agent::new(provider.clone(), registry_with(session.clone()), logger());

        let mut events = Vec::new();
        let outcome = agent
            .process_query_with("q", |e| events.push(e.clone()))
            .await
            .unwrap();

        let results = outcome.conversation.tool_results();
        let ids: Vec<_> = results.iter().map(|r| r.call_id.as_str()).collect();
        assert_eq!(ids, vec!["id_b", "id_a"]);
        assert_eq!(results[0].text(), "{\"topic\":\"b\"}");

        let topics: Vec<_> = session.calls().iter().map(|(_, args)| args["topic"].clone()).collect();
        assert_eq!(topics, vec![json!("b"), json!("a")]);

        assert!(matches!(&events[0], AgentEvent::Narration { text } if text == "Checking two things"));
        assert_eq!(events.iter().filter(|e| e.as_tool_call().is_some()).count(), 2);
        assert!(events.last().map(AgentEvent::is_answer).unwrap_or(false));

        // Second request carries the assistant framing and both results
        let second = &provider.requests()[1].messages;
        assert_eq!(second.len(), 4);
        assert_eq!(second[1].role, MessageRole::Assistant);
        assert_eq!(second[1].tool_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_arguments_forwarded_untouched() {
        let args = json!({ "topic": "quantum", "max_results": 5, "filters": { "year": [2023, 2024] }, "exact": null });
        let session = search_session();
        let provider = Arc::new(MockProvider::with_turns(
            vec![
                ProviderTurn::tool_calls(vec![call("c1", "search_papers", args.clone())]),
                ProviderTurn::answer("fine"),
            ],
            logger(),
        ));
        let agent = Agent::new(provider, registry_with(session.clone()), logger());

        agent.process_query("q").await.unwrap();
        assert_eq!(session.calls(), vec![("search_papers".to_string(), args)]);
    }

    #[tokio::test]
    async fn test_unknown_tool_fails_query() {
        let provider = Arc::new(MockProvider::with_turns(
            vec![ProviderTurn::tool_calls(vec![call("c1", "ghost", json!({}))])],
            logger(),
        ));
        let agent = Agent::new(provider, registry_with(search_session()), logger());

        let err = agent.process_query("q").await.unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn test_session_failure_vs_in_band_error() {
        let session = search_session();
        session.queue("extract_info", MockToolBehavior::Fail("server crashed".to_string()));
        let provider = Arc::new(MockProvider::with_turns(
            vec![ProviderTurn::tool_calls(vec![call("c1", "extract_info", json!({}))])],
            logger(),
        ));
        let agent = Agent::new(provider, registry_with(session.clone()), logger());
        assert!(matches!(
            agent.process_query("q").await,
            Err(AgentError::ToolExecution { tool, .. }) if tool == "extract_info"
        ));

        session.queue("extract_info", MockToolBehavior::Reply(ToolPayload::error("bad id")));
        let provider = Arc::new(MockProvider::with_turns(
            vec![
                ProviderTurn::tool_calls(vec![call("c2", "extract_info", json!({}))]),
                ProviderTurn::answer("that paper does not exist"),
            ],
            logger(),
        ));
        let agent = Agent::new(provider, registry_with(session), logger());
        let outcome = agent.process_query("q").await.unwrap();
        let results = outcome.conversation.tool_results();
        assert!(results[0].is_error);
        assert_eq!(outcome.answer, "that paper does not exist");
    }

    #[tokio::test]
    async fn test_failure_isolated_between_queries() {
        let provider = Arc::new(MockProvider::scripted(
            vec![
                MockReply::Error("503 overloaded".to_string()),
                MockReply::Turn(ProviderTurn::answer("second answer")),
            ],
            logger(),
        ));
        let agent = Agent::new(provider.clone(), registry_with(search_session()), logger());

        assert!(matches!(
            agent.process_query("first").await,
            Err(AgentError::BackendRequest(_))
        ));
        let outcome = agent.process_query("second").await.unwrap();
        assert_eq!(outcome.answer, "second answer");

        // Nothing from the failed query leaks into the next one
        let second = &provider.requests()[1].messages;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].text(), Some("second"));
    }

    #[tokio::test]
    async fn test_tool_failure_does_not_poison_next_query() {
        let session = search_session();
        session.queue("extract_info", MockToolBehavior::Fail("server crashed".to_string()));

        let lookup = || ProviderTurn::tool_calls(vec![call("c1", "extract_info", json!({ "id": "2401.001" }))]);
        let provider = Arc::new(MockProvider::with_turns(
            vec![lookup(), lookup(), ProviderTurn::answer("Paper 2401.001 is about diffusion.")],
            logger(),
        ));
        let agent = Agent::new(provider.clone(), registry_with(session.clone()), logger());

        let first = agent.process_query("what is 2401.001 about?").await;
        assert!(matches!(
            first,
            Err(AgentError::ToolExecution { tool, .. }) if tool == "extract_info"
        ));

        let second = agent.process_query("what is 2401.001 about?").await.unwrap();
        assert_eq!(second.answer, "Paper 2401.001 is about diffusion.");
        assert_eq!(second.tool_rounds, 1);
        assert_eq!(second.conversation.tool_results()[0].text(), "paper details");

        // Same session served both queries; Q2 started from a clean transcript
        assert_eq!(session.calls().len(), 2);
        assert_eq!(session.close_count(), 0);
        let requests = provider.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].messages.len(), 1);
    }
}
