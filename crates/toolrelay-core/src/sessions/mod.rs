//! Tool server session lifecycle

mod manager;

pub use manager::{ConnectReport, McpConnector, SessionConnector, SessionManager, TeardownReport};
