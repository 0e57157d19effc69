//! Trigger sources: the heterogeneous producers of [`rex_core::Event`] that
//! feed the dispatcher's shared event channel.
//!
//! All five variants (filesystem, scheduled, webhook, lifecycle, manual)
//! are collected behind the single [`TriggerInstance`] enum rather than a
//! trait object, per the component design's preference for tagged variants:
//! the dispatcher only ever needs `rule_name`/`start`/`stop`, and matching
//! on a closed enum keeps that capability set explicit at the call site.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod error;
mod filesystem;
mod lifecycle;
mod manual;
mod schedule;
mod scheduled;
mod webhook;

pub use error::TriggerError;
pub use filesystem::FilesystemSource;
pub use lifecycle::LifecycleSource;
pub use manual::ManualSource;
pub use schedule::ScheduleKind;
pub use scheduled::ScheduledSource;
pub use webhook::{WebhookDecision, WebhookSource};

use rex_core::{Event, Rule, Trigger};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Bounded, non-blocking-send sink every trigger publishes `Event`s onto.
pub type EventSender = mpsc::Sender<Event>;

/// The live instance bound to one enabled rule, owning whatever runtime
/// state that variant needs (watcher handles, debounce maps, timers).
pub enum TriggerInstance {
    Filesystem(FilesystemSource),
    Scheduled(ScheduledSource),
    Webhook(WebhookSource),
    Lifecycle(LifecycleSource),
    Manual(ManualSource),
}

impl TriggerInstance {
    /// Builds the runtime trigger instance for an enabled rule. Fails only
    /// for scheduled rules whose schedule expression cannot be parsed —
    /// everything the loader itself validates is assumed to already hold.
    pub fn new(rule: &Rule) -> Result<Self, TriggerError> {
        Ok(match &rule.trigger {
            Trigger::Filesystem(cfg) => TriggerInstance::Filesystem(FilesystemSource::new(rule.name.clone(), cfg.clone(), rule.run_as_user.clone())),
            Trigger::Scheduled(cfg) => TriggerInstance::Scheduled(ScheduledSource::new(rule.name.clone(), cfg)?),
            Trigger::Webhook(cfg) => TriggerInstance::Webhook(WebhookSource::new(rule.name.clone(), cfg.clone())),
            Trigger::Lifecycle(cfg) => TriggerInstance::Lifecycle(LifecycleSource::new(rule.name.clone(), cfg.clone())),
            Trigger::Manual => TriggerInstance::Manual(ManualSource::new(rule.name.clone())),
        })
    }

    pub fn rule_name(&self) -> &str {
        match self {
            TriggerInstance::Filesystem(s) => s.rule_name(),
            TriggerInstance::Scheduled(s) => s.rule_name(),
            TriggerInstance::Webhook(s) => s.rule_name(),
            TriggerInstance::Lifecycle(s) => s.rule_name(),
            TriggerInstance::Manual(s) => s.rule_name(),
        }
    }

    /// Runs until `cancel` is triggered. Never returns before then except
    /// for the webhook and lifecycle variants, whose `start` is a pure
    /// await on cancellation (they own no long-running loop of their own).
    pub async fn start(&self, cancel: CancellationToken, out: EventSender) {
        match self {
            TriggerInstance::Filesystem(s) => s.start(cancel, out).await,
            TriggerInstance::Scheduled(s) => s.start(cancel, out).await,
            TriggerInstance::Webhook(s) => s.start(cancel, out).await,
            TriggerInstance::Lifecycle(s) => s.start(cancel, out).await,
            TriggerInstance::Manual(s) => s.start(cancel, out).await,
        }
    }

    pub async fn stop(&self) {
        match self {
            TriggerInstance::Filesystem(s) => s.stop().await,
            TriggerInstance::Scheduled(s) => s.stop().await,
            TriggerInstance::Webhook(s) => s.stop().await,
            TriggerInstance::Lifecycle(s) => s.stop().await,
            TriggerInstance::Manual(s) => s.stop().await,
        }
    }

    /// Narrows to the lifecycle variant, used by the dispatcher to fan out
    /// `daemon_started`/`daemon_stopped` without a trait object.
    pub fn as_lifecycle(&self) -> Option<&LifecycleSource> {
        match self {
            TriggerInstance::Lifecycle(s) => Some(s),
            _ => None,
        }
    }

    /// Narrows to the manual variant, used by the CLI's `fire` command.
    pub fn as_manual(&self) -> Option<&ManualSource> {
        match self {
            TriggerInstance::Manual(s) => Some(s),
            _ => None,
        }
    }
}

/// Non-blocking enqueue used by every trigger source: on a full channel,
/// logs a warning and drops the event rather than blocking the producer.
pub(crate) fn try_send(out: &EventSender, event: Event) {
    if out.try_send(event).is_err() {
        tracing::warn!("event channel full, dropping event");
    }
}
