//! Query orchestration
//!
//! An [`Agent`] owns a provider handle and a read-only view of the tool
//! registry. Each query starts a fresh [`Conversation`](crate::types::Conversation),
//! alternates model turns with tool dispatch, and ends at the first
//! turn that carries no tool calls.

mod orchestrator;

pub use orchestrator::{Agent, QueryOutcome};
