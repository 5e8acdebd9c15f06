//! Line-oriented chat loop

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use toolrelay_core::{Agent, AgentEvent};

/// Typing this (any case) ends the session
pub const QUIT_COMMAND: &str = "quit";

const PROMPT: &str = "\nQuery: ";

/// Counters reported when the loop ends
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub queries: usize,
    pub failures: usize,
}

/// Reads queries line by line and prints each step of the agent's work
pub struct ChatLoop<'a, R, W> {
    agent: &'a Agent,
    input: R,
    output: W,
}

impl<'a, R, W> ChatLoop<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    pub fn new(agent: &'a Agent, input: R, output: W) -> Self {
        Self { agent, input, output }
    }

    /// Run until `quit` or end of input
    ///
    /// A failed query prints `Error: ...` and the loop keeps going.
    pub async fn run(&mut self) -> std::io::Result<LoopStats> {
        let mut stats = LoopStats::default();
        writeln!(self.output, "\nChat started. Type your queries or '{}' to exit.", QUIT_COMMAND)?;

        loop {
            write!(self.output, "{}", PROMPT)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line).await? == 0 {
                break;
            }
            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if query.eq_ignore_ascii_case(QUIT_COMMAND) {
                break;
            }

            stats.queries += 1;
            if !self.ask(query).await? {
                stats.failures += 1;
            }
        }

        Ok(stats)
    }

    /// Process one query; `Ok(false)` when the query failed
    pub async fn ask(&mut self, query: &str) -> std::io::Result<bool> {
        let output = &mut self.output;
        let result = self
            .agent
            .process_query_with(query, |event| print_event(&mut *output, event))
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                writeln!(self.output, "\nError: {}", e)?;
                Ok(false)
            }
        }
    }
}

fn print_event<W: Write>(out: &mut W, event: &AgentEvent) {
    // Write errors here are dropped; the query keeps running
    let _ = match event {
        AgentEvent::Narration { text } | AgentEvent::Answer { text } => writeln!(out, "{}", text),
        AgentEvent::ToolCall { tool_call } => writeln!(
            out,
            "Calling tool {} with args {}",
            tool_call.name, tool_call.input
        ),
        AgentEvent::ToolResult { .. } => Ok(()),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use toolrelay_core::mcp::MockToolSession;
    use toolrelay_core::providers::{MockProvider, MockReply};
    use toolrelay_core::{Logger, NoOpLogger, ProviderTurn, ToolCall, ToolRegistry};

    fn logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    fn agent(provider: MockProvider) -> Agent {
        let mut registry = ToolRegistry::new(logger());
        let session = Arc::new(MockToolSession::new("notes").with_text_tool("lookup", "found it"));
        registry.register(session, vec![toolrelay_core::ToolDescriptor::new("lookup", "Look up a note")]);
        Agent::new(Arc::new(provider), Arc::new(registry), logger())
    }

    async fn run(agent: &Agent, input: &str) -> (LoopStats, String) {
        let mut out = Vec::new();
        let stats = ChatLoop::new(agent, input.as_bytes(), &mut out).run().await.unwrap();
        (stats, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_echo_then_quit() {
        let agent = agent(MockProvider::echo(logger()));
        let (stats, out) = run(&agent, "hello there\n\n   \nQUIT\nnever read\n").await;

        assert_eq!(stats, LoopStats { queries: 1, failures: 0 });
        assert!(out.contains("hello there"));
        assert!(!out.contains("never read"));
        assert_eq!(out.matches("Query: ").count(), 4);
    }

    #[tokio::test]
    async fn test_end_of_input_stops_loop() {
        let agent = agent(MockProvider::echo(logger()));
        let (stats, _) = run(&agent, "one\ntwo").await;
        assert_eq!(stats.queries, 2);
    }

    #[tokio::test]
    async fn test_tool_call_is_printed() {
        let provider = MockProvider::with_turns(
            vec![
                ProviderTurn::ToolCalls {
                    narration: vec!["Let me check.".to_string()],
                    calls: vec![ToolCall::new("c1", "lookup", json!({ "id": 7 }))],
                },
                ProviderTurn::answer("Note 7 says hi."),
            ],
            logger(),
        );
        let agent = agent(provider);
        let (_, out) = run(&agent, "what does note 7 say?\nquit\n").await;

        assert!(out.contains("Let me check.\n"));
        assert!(out.contains("Calling tool lookup with args {\"id\":7}\n"));
        assert!(out.contains("Note 7 says hi.\n"));
    }

    #[tokio::test]
    async fn test_error_does_not_end_loop() {
        let provider = MockProvider::scripted(
            vec![
                MockReply::Error("rate limited".to_string()),
                MockReply::Turn(ProviderTurn::answer("recovered")),
            ],
            logger(),
        );
        let agent = agent(provider);
        let (stats, out) = run(&agent, "first\nsecond\nquit\n").await;

        assert_eq!(stats, LoopStats { queries: 2, failures: 1 });
        assert!(out.contains("\nError: Backend request failed:"));
        assert!(out.contains("recovered"));
    }
}
