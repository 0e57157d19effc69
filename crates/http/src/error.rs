use rex_core::{Severe, Severity};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("failed to bind HTTP listener on {0}: {1}")]
    Bind(String, std::io::Error),
}

impl Severe for HttpError {
    fn severity(&self) -> Severity {
        Severity::Fatal
    }
}
