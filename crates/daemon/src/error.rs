use rex_core::{Severe, Severity};
use thiserror::Error;

/// Wraps every crate boundary's error type behind a single daemon-level
/// enum so the startup and reload paths can decide fatal-vs-log-and-continue
/// by asking `.severity()` once rather than re-deriving the taxonomy at
/// each call site.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to read global config at {0}: {1}")]
    ConfigRead(std::path::PathBuf, std::io::Error),

    #[error(transparent)]
    Rule(#[from] rex_rules::RuleError),

    #[error(transparent)]
    History(#[from] rex_history::HistoryError),

    #[error(transparent)]
    Http(#[from] rex_http::HttpError),

    #[error("failed to open log file at {0}: {1}")]
    LogOpen(std::path::PathBuf, std::io::Error),

    #[error("rules directory {0} does not exist")]
    RulesDirMissing(std::path::PathBuf),
}

impl Severe for DaemonError {
    fn severity(&self) -> Severity {
        match self {
            DaemonError::ConfigRead(..) => Severity::Fatal,
            DaemonError::Rule(e) => e.severity(),
            DaemonError::History(e) => e.severity(),
            DaemonError::Http(e) => e.severity(),
            DaemonError::LogOpen(..) => Severity::Fatal,
            DaemonError::RulesDirMissing(_) => Severity::Fatal,
        }
    }
}
