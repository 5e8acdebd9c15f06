//! Tool catalog and routing
//!
//! ```text
//!   server A ──┐
//!   server B ──┼──> ToolRegistry ──catalog()──> Provider
//!   server C ──┘         │
//!                        └──resolve(name)──> owning ToolSession
//! ```

mod registry;

pub use registry::ToolRegistry;
