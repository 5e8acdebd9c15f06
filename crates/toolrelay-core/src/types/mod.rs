//! Core types shared by providers, tool sessions and the orchestration loop

mod message;
mod tool;
mod conversation;
mod event;

pub use message::{ChatMessage, ContentPart, MessageRole, MessageContent};
pub use tool::{ToolDescriptor, ToolCall, ToolOutput, ToolPayload, ToolResult};
pub use conversation::Conversation;
pub use event::AgentEvent;
