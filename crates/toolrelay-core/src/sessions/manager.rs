//! Owns every tool session for the life of the process
//!
//! Connection attempts run concurrently; registration and bookkeeping
//! happen afterwards in config order so that tool-name collisions resolve
//! the same way on every run.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;

use crate::config::{ServerConfig, ServerList};
use crate::error::AgentError;
use crate::logging::Logger;
use crate::mcp::{McpClient, McpError, McpResult, ToolSession};
use crate::tools::ToolRegistry;
use crate::types::ToolDescriptor;

/// Opens a session for one configured server
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(&self, name: &str, config: &ServerConfig) -> McpResult<Arc<dyn ToolSession>>;
}

/// Production connector backed by rmcp
pub struct McpConnector {
    logger: Arc<dyn Logger>,
}

impl McpConnector {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl SessionConnector for McpConnector {
    async fn connect(&self, name: &str, config: &ServerConfig) -> McpResult<Arc<dyn ToolSession>> {
        let client = McpClient::connect(name, config, Arc::clone(&self.logger)).await?;
        Ok(Arc::new(client))
    }
}

/// Outcome of `connect_all`
#[derive(Debug, Default)]
pub struct ConnectReport {
    /// (server, tool names) in config order
    pub connected: Vec<(String, Vec<String>)>,
    /// Servers that could not be used
    pub failed: Vec<AgentError>,
}

impl ConnectReport {
    pub fn connected_count(&self) -> usize {
        self.connected.len()
    }

    pub fn all_failed(&self) -> bool {
        self.connected.is_empty() && !self.failed.is_empty()
    }
}

/// Outcome of `teardown`
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Servers closed cleanly, in closing order
    pub closed: Vec<String>,
    /// (server, error) for sessions whose close failed
    pub failures: Vec<(String, McpError)>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Session manager
///
/// Every session that finished connecting is tracked until `teardown`,
/// which closes all of them exactly once.
pub struct SessionManager {
    connector: Arc<dyn SessionConnector>,
    opened: Mutex<Vec<Arc<dyn ToolSession>>>,
    logger: Arc<dyn Logger>,
}

impl SessionManager {
    pub fn new(connector: Arc<dyn SessionConnector>, logger: Arc<dyn Logger>) -> Self {
        Self {
            connector,
            opened: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Manager using the rmcp connector
    pub fn mcp(logger: Arc<dyn Logger>) -> Self {
        Self::new(Arc::new(McpConnector::new(Arc::clone(&logger))), logger)
    }

    /// Connect to every server and register its tools
    ///
    /// A server that fails is logged, reported and skipped. A session that
    /// opened but could not list its tools is closed before returning.
    pub async fn connect_all(&self, servers: &ServerList, registry: &mut ToolRegistry) -> ConnectReport {
        let attempts = servers.iter().map(|server| async move {
            let outcome = self.open_one(&server.name, &server.config).await;
            (server.name.clone(), outcome)
        });
        let outcomes = join_all(attempts).await;

        let mut report = ConnectReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok((session, tools)) => {
                    let tool_names: Vec<String> = tools.iter().map(|t| t.name.clone()).collect();
                    self.logger.info(&format!(
                        "[SessionManager] Connected to '{}' with {} tools",
                        name,
                        tool_names.len()
                    ));
                    self.opened.lock().push(Arc::clone(&session));
                    registry.register(session, tools);
                    report.connected.push((name, tool_names));
                }
                Err(source) => {
                    self.logger.error(&format!(
                        "[SessionManager] Failed to connect to '{}': {}",
                        name, source
                    ));
                    report.failed.push(AgentError::ServerConnection { server: name, source });
                }
            }
        }
        report
    }

    async fn open_one(
        &self,
        name: &str,
        config: &ServerConfig,
    ) -> McpResult<(Arc<dyn ToolSession>, Vec<ToolDescriptor>)> {
        self.logger.debug(&format!(
            "[SessionManager] Opening '{}' ({}: {})",
            name,
            config.transport(),
            config
        ));
        let session = self.connector.connect(name, config).await?;
        match session.list_tools().await {
            Ok(tools) => Ok((session, tools)),
            Err(e) => {
                if let Err(close_err) = session.close().await {
                    self.logger.warn(&format!(
                        "[SessionManager] Closing '{}' after failed tool listing also failed: {}",
                        name, close_err
                    ));
                }
                Err(e)
            }
        }
    }

    /// Number of sessions currently held
    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    /// Close every held session, newest first
    ///
    /// Never stops early; failures are logged and returned. Calling it again
    /// closes nothing.
    pub async fn teardown(&self) -> TeardownReport {
        let sessions = std::mem::take(&mut *self.opened.lock());
        let mut report = TeardownReport::default();

        for session in sessions.into_iter().rev() {
            let name = session.server_name().to_string();
            match session.close().await {
                Ok(()) => report.closed.push(name),
                Err(e) => {
                    self.logger.warn(&format!("[SessionManager] Error closing '{}': {}", name, e));
                    report.failures.push((name, e));
                }
            }
        }

        self.logger.info(&format!(
            "[SessionManager] Teardown closed {} sessions ({} errors)",
            report.closed.len() + report.failures.len(),
            report.failures.len()
        ));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::logging::NoOpLogger;
    use crate::mcp::MockToolSession;
    use crate::providers::{MockProvider, ProviderTurn};
    use crate::types::ToolCall;
    use serde_json::json;
    use std::collections::HashMap;

    /// Hands out prepared mock sessions by server name
    struct MockConnector {
        sessions: HashMap<String, Arc<MockToolSession>>,
    }

    impl MockConnector {
        fn new(sessions: Vec<Arc<MockToolSession>>) -> Self {
            Self {
                sessions: sessions
                    .into_iter()
                    .map(|s| (s.server_name().to_string(), s))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl SessionConnector for MockConnector {
        async fn connect(&self, name: &str, _config: &ServerConfig) -> McpResult<Arc<dyn ToolSession>> {
            match self.sessions.get(name) {
                Some(session) => Ok(Arc::clone(session) as Arc<dyn ToolSession>),
                None => Err(McpError::ConnectionFailed(format!("spawn '{}': not found", name))),
            }
        }
    }

    fn logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger::new())
    }

    fn servers(names: &[&str]) -> ServerList {
        let mut list = ServerList::new();
        for name in names {
            list.push(*name, ServerConfig::stdio("uv", vec!["run".to_string()]))
                .unwrap();
        }
        list
    }

    #[tokio::test]
    async fn test_partial_startup() {
        let s1 = Arc::new(MockToolSession::new("s1").with_text_tool("a", "A"));
        let s3 = Arc::new(MockToolSession::new("s3").with_text_tool("c", "C"));
        let manager = SessionManager::new(
            Arc::new(MockConnector::new(vec![s1.clone(), s3.clone()])),
            logger(),
        );
        let mut registry = ToolRegistry::new(logger());

        let report = manager.connect_all(&servers(&["s1", "s2", "s3"]), &mut registry).await;

        assert_eq!(report.connected_count(), 2);
        assert_eq!(report.connected[0], ("s1".to_string(), vec!["a".to_string()]));
        assert_eq!(report.connected[1].0, "s3");
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(&report.failed[0], AgentError::ServerConnection { server, .. } if server == "s2"));
        assert_eq!(registry.names(), vec!["a", "c"]);
        assert_eq!(registry.owner_name("c"), Some("s3"));
        assert_eq!(manager.open_count(), 2);
    }

    #[tokio::test]
    async fn test_query_after_partial_startup() {
        let s1 = Arc::new(MockToolSession::new("s1").with_text_tool("a", "A"));
        let s3 = Arc::new(MockToolSession::new("s3").with_text_tool("c", "C"));
        let manager = SessionManager::new(
            Arc::new(MockConnector::new(vec![s1.clone(), s3.clone()])),
            logger(),
        );
        let mut registry = ToolRegistry::new(logger());
        manager.connect_all(&servers(&["s1", "s2", "s3"]), &mut registry).await;

        let provider = Arc::new(MockProvider::with_turns(
            vec![
                ProviderTurn::tool_calls(vec![
                    ToolCall::new("call_a", "a", json!({})),
                    ToolCall::new("call_c", "c", json!({ "k": 1 })),
                ]),
                ProviderTurn::answer("done"),
            ],
            logger(),
        ));
        let agent = Agent::new(provider.clone(), Arc::new(registry), logger());

        let outcome = agent.process_query("use both").await.unwrap();
        assert_eq!(outcome.answer, "done");
        let texts: Vec<String> = outcome.conversation.tool_results().iter().map(|r| r.text()).collect();
        assert_eq!(texts, vec!["A", "C"]);
        assert_eq!(provider.requests()[0].tools.len(), 2);
        assert_eq!(s1.calls().len(), 1);
        assert_eq!(s3.calls(), vec![("c".to_string(), json!({ "k": 1 }))]);

        let teardown = manager.teardown().await;
        assert_eq!(teardown.closed, vec!["s3", "s1"]);
    }

    #[tokio::test]
    async fn test_collision_follows_config_order() {
        let first = Arc::new(MockToolSession::new("first").with_text_tool("search", "from first"));
        let second = Arc::new(MockToolSession::new("second").with_text_tool("search", "from second"));
        let manager = SessionManager::new(Arc::new(MockConnector::new(vec![first, second])), logger());
        let mut registry = ToolRegistry::new(logger());

        manager.connect_all(&servers(&["first", "second"]), &mut registry).await;

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.owner_name("search"), Some("second"));
    }

    #[tokio::test]
    async fn test_failed_listing_closes_session() {
        let broken = Arc::new(MockToolSession::new("broken").with_list_error("method not found"));
        let manager = SessionManager::new(Arc::new(MockConnector::new(vec![broken.clone()])), logger());
        let mut registry = ToolRegistry::new(logger());

        let report = manager.connect_all(&servers(&["broken"]), &mut registry).await;

        assert!(report.all_failed());
        assert_eq!(broken.close_count(), 1);
        assert_eq!(manager.open_count(), 0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_teardown_closes_all_once() {
        let a = Arc::new(MockToolSession::new("a"));
        let b = Arc::new(MockToolSession::new("b").with_close_error("broken pipe"));
        let c = Arc::new(MockToolSession::new("c"));
        let manager = SessionManager::new(
            Arc::new(MockConnector::new(vec![a.clone(), b.clone(), c.clone()])),
            logger(),
        );
        let mut registry = ToolRegistry::new(logger());
        manager.connect_all(&servers(&["a", "b", "c"]), &mut registry).await;

        let report = manager.teardown().await;
        assert_eq!(report.closed, vec!["c".to_string(), "a".to_string()]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "b");
        assert!(!report.is_clean());

        let again = manager.teardown().await;
        assert!(again.closed.is_empty() && again.is_clean());
        assert_eq!((a.close_count(), b.close_count(), c.close_count()), (1, 1, 1));
    }
}
