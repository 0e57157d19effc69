use rex_core::{Severe, Severity};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to open history database at {path}: {source}")]
    Open { path: String, source: rusqlite::Error },

    #[error("history query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("history worker task panicked: {0}")]
    WorkerPanic(String),
}

impl Severe for HistoryError {
    fn severity(&self) -> Severity {
        match self {
            HistoryError::Open { .. } => Severity::Operational,
            HistoryError::Query(_) => Severity::Operational,
            HistoryError::WorkerPanic(_) => Severity::Internal,
        }
    }
}
