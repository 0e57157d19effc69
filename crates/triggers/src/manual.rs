//! The manual trigger: fired directly by a CLI invocation rather than by
//! any background loop.

use rex_core::Event;
use tokio_util::sync::CancellationToken;

use crate::{try_send, EventSender};

pub struct ManualSource {
    rule_name: String,
}

impl ManualSource {
    pub fn new(rule_name: String) -> Self {
        Self { rule_name }
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub async fn start(&self, cancel: CancellationToken, _out: EventSender) {
        cancel.cancelled().await;
    }

    pub async fn stop(&self) {}

    /// Enqueues a manual event carrying the caller-supplied data.
    pub fn fire(&self, data: serde_json::Map<String, serde_json::Value>, out: &EventSender) {
        let event = Event::new(self.rule_name.clone(), "manual").with_data(data);
        try_send(out, event);
    }
}

#[cfg(test)]
#[path = "manual_tests.rs"]
mod tests;
