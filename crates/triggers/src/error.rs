use rex_core::{Severe, Severity};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("invalid cron expression `{0}`: {1}")]
    InvalidCronExpression(String, String),

    #[error("invalid `run_every` token `{0}` (expected `<N>m` or `<N>h`)")]
    InvalidRunEvery(String),

    #[error("invalid `run_at` token `{0}` (expected `HH:MM`)")]
    InvalidRunAt(String),

    #[error("failed to start filesystem watcher on `{0}`: {1}")]
    WatcherStart(String, String),
}

impl Severe for TriggerError {
    fn severity(&self) -> Severity {
        Severity::Configuration
    }
}
