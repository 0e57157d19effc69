use rex_core::{Severe, Severity};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("agent configuration would append {0} argv entries, exceeding max_actions ({1})")]
    MaxActionsExceeded(u32, u32),

    #[error("failed to write temporary mcp-config file: {0}")]
    McpConfigWrite(#[from] std::io::Error),

    #[error("failed to spawn agent process: {0}")]
    Spawn(String),
}

impl Severe for ExecutorError {
    fn severity(&self) -> Severity {
        match self {
            ExecutorError::MaxActionsExceeded(..) => Severity::Configuration,
            ExecutorError::McpConfigWrite(_) | ExecutorError::Spawn(_) => Severity::Operational,
        }
    }
}
