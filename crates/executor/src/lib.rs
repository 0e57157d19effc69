//! Builds argv for the external agent, synthesises the memory MCP config
//! when needed, and invokes the subprocess under a timeout with cooperative
//! cancellation.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod argv;
mod error;
mod invoke;
mod mcp_temp;

pub use argv::build_argv;
pub use error::ExecutorError;
pub use invoke::{invoke, ExecutionOutcome};
pub use mcp_temp::MemoryMcpConfig;
