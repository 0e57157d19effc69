//! The scheduled trigger: a cron-style ticker with second precision.

use rex_core::{Event, ScheduledTrigger};
use tokio_util::sync::CancellationToken;

use crate::error::TriggerError;
use crate::schedule::ScheduleKind;
use crate::{try_send, EventSender};

pub struct ScheduledSource {
    rule_name: String,
    schedule: ScheduleKind,
}

impl ScheduledSource {
    pub fn new(rule_name: String, config: &ScheduledTrigger) -> Result<Self, TriggerError> {
        Ok(Self { rule_name, schedule: ScheduleKind::from_trigger(config)? })
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// Ticks until cancelled, emitting `{type: "scheduled"}` at each fire
    /// and waiting for an in-progress tick to finish before stopping, since
    /// the event construction and send happen synchronously within the
    /// same loop iteration as the cancellation check.
    pub async fn start(&self, cancel: CancellationToken, out: EventSender) {
        loop {
            let delay = self.schedule.next_delay(chrono::Utc::now());
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {
                    try_send(&out, Event::new(self.rule_name.clone(), "scheduled"));
                }
            }
        }
    }

    pub async fn stop(&self) {}
}

#[cfg(test)]
#[path = "scheduled_tests.rs"]
mod tests;
