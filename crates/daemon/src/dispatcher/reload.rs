//! Differential trigger restart: given a freshly loaded rule set, brings
//! the live trigger set in line with it without disturbing any handler
//! that is already running (§4.8, §9 "hot-reload safety").

use rex_core::Rule;
use tokio_util::sync::CancellationToken;

use super::Dispatcher;

impl Dispatcher {
    /// Applies `new_rules` against the live set: removed rules have their
    /// triggers torn down and are dropped; brand-new enabled rules get a
    /// trigger started; rules present in both sets are compared
    /// field-by-field and only get their trigger replaced when a
    /// trigger-affecting field differs (invariant I2, §4.8). The full rule
    /// body is always replaced so non-trigger-affecting edits (prompt,
    /// agent config, `depends_on_rules`, ...) take effect immediately even
    /// when the trigger itself is left alone.
    pub async fn reload_rules(self: &std::sync::Arc<Self>, new_rules: Vec<Rule>, parent_cancel: &CancellationToken) {
        let previous: Vec<Rule> = self.rules.read().clone();

        for old in &previous {
            if !new_rules.iter().any(|r| r.name == old.name) {
                tracing::info!(rule = %old.name, "rule removed on reload, stopping trigger");
                self.stop_trigger(&old.name).await;
            }
        }

        for new in &new_rules {
            match previous.iter().find(|r| r.name == new.name) {
                None => {
                    tracing::info!(rule = %new.name, "rule added on reload");
                    if new.enabled {
                        self.start_trigger(new, parent_cancel).await;
                    }
                }
                Some(old) => self.reconcile_trigger(old, new, parent_cancel).await,
            }
        }

        *self.rules.write() = new_rules;
    }

    async fn reconcile_trigger(self: &std::sync::Arc<Self>, old: &Rule, new: &Rule, parent_cancel: &CancellationToken) {
        match (old.enabled, new.enabled) {
            (true, false) => {
                tracing::info!(rule = %new.name, "rule disabled on reload, trigger torn down, entry retained");
                self.stop_trigger(&new.name).await;
            }
            (false, true) => {
                tracing::info!(rule = %new.name, "rule enabled on reload, starting trigger");
                self.start_trigger(new, parent_cancel).await;
            }
            (true, true) if old.trigger_affecting_fields_differ(new) => {
                tracing::info!(rule = %new.name, "trigger-affecting fields changed on reload, trigger replaced");
                self.stop_trigger(&new.name).await;
                self.start_trigger(new, parent_cancel).await;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "reload_tests.rs"]
mod tests;
