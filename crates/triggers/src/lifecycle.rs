//! The lifecycle trigger: never self-fires. The dispatcher calls `fire`
//! directly on `daemon_started` and, during shutdown, on `daemon_stopped`.

use rex_core::{Event, LifecycleTrigger};
use tokio_util::sync::CancellationToken;

use crate::{try_send, EventSender};

pub struct LifecycleSource {
    rule_name: String,
    config: LifecycleTrigger,
}

impl LifecycleSource {
    pub fn new(rule_name: String, config: LifecycleTrigger) -> Self {
        Self { rule_name, config }
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// Whether this rule is registered for the given lifecycle event type.
    pub fn handles(&self, event_type: &str) -> bool {
        self.config.on_events.iter().any(|e| e == event_type)
    }

    pub async fn start(&self, cancel: CancellationToken, _out: EventSender) {
        cancel.cancelled().await;
    }

    pub async fn stop(&self) {}

    /// Non-blocking enqueue: drops the event when the channel is full.
    pub fn fire(&self, event_type: &str, out: &EventSender) {
        try_send(out, Event::new(self.rule_name.clone(), event_type));
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
