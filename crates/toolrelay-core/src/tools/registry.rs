//! Tool registry mapping tool names to the sessions that own them
//!
//! The registry is filled once at startup, one server at a time in config
//! order, and then shared read-only behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, AgentResult};
use crate::logging::Logger;
use crate::mcp::ToolSession;
use crate::types::ToolDescriptor;

/// Unified catalog of tools across every connected server
///
/// Every name in the catalog has exactly one owning session. When two
/// servers advertise the same name, the later registration wins: its
/// descriptor replaces the earlier one in place, so catalog order stays
/// stable.
pub struct ToolRegistry {
    catalog: Vec<ToolDescriptor>,
    /// name -> position in `catalog`
    index: HashMap<String, usize>,
    owners: HashMap<String, Arc<dyn ToolSession>>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            catalog: Vec::new(),
            index: HashMap::new(),
            owners: HashMap::new(),
            logger,
        }
    }

    /// Register descriptors owned by `session`
    ///
    /// Returns the names that replaced an entry from another registration.
    pub fn register(
        &mut self,
        session: Arc<dyn ToolSession>,
        descriptors: Vec<ToolDescriptor>,
    ) -> Vec<String> {
        let mut replaced = Vec::new();

        for descriptor in descriptors {
            let name = descriptor.name.clone();
            match self.index.get(&name) {
                Some(&slot) => {
                    let previous = self
                        .owners
                        .get(&name)
                        .map(|s| s.server_name().to_string())
                        .unwrap_or_default();
                    self.logger.warn(&format!(
                        "[ToolRegistry] Tool '{}' from '{}' replaces the one from '{}'",
                        name,
                        session.server_name(),
                        previous
                    ));
                    self.catalog[slot] = descriptor;
                    replaced.push(name.clone());
                }
                None => {
                    self.index.insert(name.clone(), self.catalog.len());
                    self.catalog.push(descriptor);
                }
            }
            self.owners.insert(name, Arc::clone(&session));
        }

        self.logger.debug(&format!(
            "[ToolRegistry] {} tools after registering '{}'",
            self.catalog.len(),
            session.server_name()
        ));
        replaced
    }

    /// All descriptors in registration order
    pub fn catalog(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    /// The session that owns `name`
    pub fn resolve(&self, name: &str) -> AgentResult<Arc<dyn ToolSession>> {
        self.owners
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.index.get(name).map(|&slot| &self.catalog[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Server name of the session that owns `name`
    pub fn owner_name(&self, name: &str) -> Option<&str> {
        self.owners.get(name).map(|s| s.server_name())
    }

    /// Tool names in catalog order
    pub fn names(&self) -> Vec<&str> {
        self.catalog.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
