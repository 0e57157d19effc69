//! The core event loop: enrichment, dependency check, bounded dispatch,
//! render + execute + classify, result policy, and chain evaluation.

mod chain;
mod in_flight;
mod reload;

#[cfg(test)]
mod test_support;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use rex_core::{render_template, sanitize, AgentConfig, Event, EventId, ExecutionState, HandlerId, OnFailure, Rule};
use rex_executor::{build_argv, invoke, MemoryMcpConfig};
use rex_history::{HistoryStore, NewExecutionRecord};
use rex_triggers::{EventSender, TriggerInstance, WebhookSource};
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

pub use in_flight::InFlight;

const EVENT_DATA_MAX_CHARS: usize = 1024;
const OUTPUT_MAX_CHARS: usize = 10 * 1024;

/// The live instance bound to one enabled rule, plus enough bookkeeping to
/// tear it down individually on reload.
struct TriggerEntry {
    cancel: CancellationToken,
    instance: Arc<TriggerInstance>,
    listen_path: Option<String>,
}

/// Everything the executor needs that isn't per-rule: where the agent
/// binary lives, the merged defaults, and the memory-MCP wiring.
pub struct ExecContext {
    pub agent_path: String,
    pub debug: bool,
    pub agent_defaults: AgentConfig,
    pub memory_enabled: bool,
    pub memory_path: Option<String>,
    pub daemon_exe: Option<PathBuf>,
    pub home_dir: Option<PathBuf>,
}

/// The event loop plus the shared, lock-protected live state described by
/// the component design: `rules`, `triggers`, `webhooks`, `last_run_state`.
pub struct Dispatcher {
    rules: Arc<RwLock<Vec<Rule>>>,
    triggers: RwLock<HashMap<String, TriggerEntry>>,
    webhooks: Arc<RwLock<HashMap<String, Arc<WebhookSource>>>>,
    last_run_state: Arc<Mutex<HashMap<String, String>>>,
    event_tx: EventSender,
    history: Option<Arc<HistoryStore>>,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<InFlight>,
    exec: ExecContext,
}

impl Dispatcher {
    pub fn new(
        rules: Arc<RwLock<Vec<Rule>>>,
        webhooks: Arc<RwLock<HashMap<String, Arc<WebhookSource>>>>,
        last_run_state: Arc<Mutex<HashMap<String, String>>>,
        event_tx: EventSender,
        history: Option<Arc<HistoryStore>>,
        max_concurrent: usize,
        exec: ExecContext,
    ) -> Arc<Self> {
        Arc::new(Self {
            rules,
            triggers: RwLock::new(HashMap::new()),
            webhooks,
            last_run_state,
            event_tx,
            history,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            in_flight: InFlight::new(),
            exec,
        })
    }

    pub fn rules_handle(&self) -> Arc<RwLock<Vec<Rule>>> {
        Arc::clone(&self.rules)
    }

    pub fn event_sender(&self) -> EventSender {
        self.event_tx.clone()
    }

    pub fn webhooks_handle(&self) -> Arc<RwLock<HashMap<String, Arc<WebhookSource>>>> {
        Arc::clone(&self.webhooks)
    }

    pub fn last_run_state_handle(&self) -> Arc<Mutex<HashMap<String, String>>> {
        Arc::clone(&self.last_run_state)
    }

    pub fn history_handle(&self) -> Option<Arc<HistoryStore>> {
        self.history.clone()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.current()
    }

    /// Starts a trigger task for every enabled rule currently in `rules`.
    pub async fn start_all_triggers(self: &Arc<Self>, parent_cancel: &CancellationToken) {
        let rules: Vec<Rule> = self.rules.read().clone();
        for rule in rules.iter().filter(|r| r.enabled) {
            self.start_trigger(rule, parent_cancel).await;
        }
    }

    async fn start_trigger(self: &Arc<Self>, rule: &Rule, parent_cancel: &CancellationToken) {
        let instance = match TriggerInstance::new(rule) {
            Ok(i) => Arc::new(i),
            Err(e) => {
                tracing::error!(rule = %rule.name, error = %e, "failed to create trigger, rule left without one");
                return;
            }
        };

        let listen_path = if let rex_core::Trigger::Webhook(cfg) = &rule.trigger {
            let webhook = Arc::new(WebhookSource::new(rule.name.clone(), cfg.clone()));
            self.webhooks.write().insert(cfg.listen_path.clone(), webhook);
            Some(cfg.listen_path.clone())
        } else {
            None
        };

        let child_cancel = parent_cancel.child_token();
        let spawned = Arc::clone(&instance);
        let out = self.event_tx.clone();
        let task_cancel = child_cancel.clone();
        tokio::spawn(async move {
            spawned.start(task_cancel, out).await;
        });

        self.triggers.write().insert(rule.name.clone(), TriggerEntry { cancel: child_cancel, instance, listen_path });
    }

    async fn stop_trigger(&self, name: &str) {
        let entry = self.triggers.write().remove(name);
        if let Some(entry) = entry {
            entry.cancel.cancel();
            entry.instance.stop().await;
            if let Some(path) = entry.listen_path {
                self.webhooks.write().remove(&path);
            }
        }
    }

    /// Fans `event_type` out through the channel to every registered
    /// lifecycle trigger that handles it (`daemon_started`).
    pub fn fire_lifecycle_via_channel(&self, event_type: &str) {
        let triggers = self.triggers.read();
        for entry in triggers.values() {
            if let Some(lifecycle) = entry.instance.as_lifecycle() {
                if lifecycle.handles(event_type) {
                    lifecycle.fire(event_type, &self.event_tx);
                }
            }
        }
    }

    /// Invokes every lifecycle rule registered for `event_type` directly,
    /// bypassing the channel — used for `daemon_stopped`, since the event
    /// loop has already stopped reading by the time this runs.
    pub async fn fire_lifecycle_direct(&self, event_type: &str, cancel: CancellationToken) {
        let rule_names: Vec<String> = {
            let triggers = self.triggers.read();
            triggers
                .iter()
                .filter_map(|(name, entry)| match entry.instance.as_lifecycle() {
                    Some(l) if l.handles(event_type) => Some(name.clone()),
                    _ => None,
                })
                .collect()
        };

        let mut handles = Vec::new();
        for name in rule_names {
            if let Some(rule) = self.snapshot_rule(&name) {
                let mut event = Event::new(name, event_type);
                event.enrich();
                handles.push(self.execute_with_retries(rule, event, cancel.clone()));
            }
        }
        futures_util::future::join_all(handles).await;
    }

    /// Manually fires a rule, mirroring the manual trigger's `fire`, used
    /// by the CLI's `rex fire` and by the dispatcher's own chain enqueue.
    pub fn enqueue(&self, event: Event) {
        if self.event_tx.try_send(event).is_err() {
            tracing::warn!("event channel full, dropping event");
        }
    }

    fn snapshot_rule(&self, name: &str) -> Option<Rule> {
        self.rules.read().iter().find(|r| r.name == name).cloned()
    }

    fn dependency_check(&self, rule: &Rule) -> bool {
        if rule.depends_on_rules.is_empty() {
            return true;
        }
        let last_run_state = self.last_run_state.lock();
        rule.depends_on_rules.iter().all(|dep| last_run_state.get(dep).map(|s| s == "success").unwrap_or(false))
    }

    /// Runs until `cancel` fires, then awaits every in-flight handler
    /// before returning (invariant I8).
    pub async fn run_event_loop(self: Arc<Self>, mut event_rx: mpsc::Receiver<Event>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe_event = event_rx.recv() => {
                    let Some(mut event) = maybe_event else { break };
                    event.enrich();
                    let event_id = EventId::new();

                    let Some(rule) = self.snapshot_rule(&event.rule_name) else {
                        tracing::debug!(rule = %event.rule_name, %event_id, "event for unknown or disabled rule, dropped");
                        continue;
                    };

                    if !self.dependency_check(&rule) {
                        tracing::info!(rule = %rule.name, %event_id, "dependencies not met, event dropped");
                        continue;
                    }

                    let this = Arc::clone(&self);
                    let handler_cancel = cancel.clone();
                    tokio::spawn(async move {
                        this.handle_accepted_event(rule, event, event_id, handler_cancel).await;
                    });
                }
            }
        }

        self.in_flight.wait_for_zero().await;
    }

    async fn handle_accepted_event(self: Arc<Self>, rule: Rule, event: Event, event_id: EventId, cancel: CancellationToken) {
        let handler_id = HandlerId::new();
        let span = tracing::info_span!("handler", rule = %rule.name, %event_id, handler_id = %handler_id);
        async move {
            let Ok(_permit) = self.semaphore.clone().acquire_owned().await else { return };
            let _guard = self.in_flight.enter();
            self.execute_with_retries(rule, event, cancel).await;
        }
        .instrument(span)
        .await;
    }

    async fn execute_with_retries(&self, rule: Rule, event: Event, cancel: CancellationToken) {
        let mut retry_attempt = 0u32;
        loop {
            if cancel.is_cancelled() {
                return;
            }

            let (outcome, started_at, finished_at) = self.execute_once(&rule, &event, cancel.clone()).await;
            self.persist(&rule, &event, &outcome, retry_attempt, started_at, finished_at).await;

            match outcome.state {
                ExecutionState::Success => {
                    self.last_run_state.lock().insert(rule.name.clone(), "success".to_string());
                    self.evaluate_chain(&rule, &event, &outcome.output);
                    return;
                }
                ExecutionState::Cancelled => {
                    self.last_run_state.lock().insert(rule.name.clone(), "cancelled".to_string());
                    return;
                }
                ExecutionState::Failure | ExecutionState::Timeout => {
                    self.last_run_state.lock().insert(rule.name.clone(), outcome.state.to_string());
                    if !should_retry(&rule.on_failure, retry_attempt) {
                        return;
                    }
                    retry_attempt += 1;
                    let delay = std::time::Duration::from_secs(rule.on_failure.delay_seconds());
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            self.last_run_state.lock().insert(rule.name.clone(), "cancelled".to_string());
                            return;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    async fn execute_once(
        &self,
        rule: &Rule,
        event: &Event,
        cancel: CancellationToken,
    ) -> (rex_executor::ExecutionOutcome, chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
        let started_at = Utc::now();

        let prompt = render_template(&rule.action_prompt, &event.data);
        let mut agent_config = rule.agent_config.merge(&self.exec.agent_defaults);
        if rule.dry_run {
            agent_config.permission_mode = Some("plan".to_string());
        }
        let home = rex_core::resolve_run_as_user_home(rule.run_as_user.as_deref(), self.exec.home_dir.as_deref());
        agent_config.add_dirs = agent_config.add_dirs.iter().map(|d| rex_core::expand_tilde(d, home.as_deref())).collect();

        let memory_enabled = agent_config.memory.unwrap_or(self.exec.memory_enabled);
        let memory_guard = if memory_enabled {
            match (&self.exec.daemon_exe, &self.exec.memory_path) {
                (Some(exe), Some(path)) => match MemoryMcpConfig::write(exe, path) {
                    Ok(guard) => Some(guard),
                    Err(e) => {
                        tracing::warn!(rule = %rule.name, error = %e, "failed to write memory mcp config, continuing without it");
                        None
                    }
                },
                _ => None,
            }
        } else {
            None
        };

        let argv = match build_argv(&agent_config, &prompt, self.exec.debug, rule.max_actions, memory_guard.as_ref().map(|m| m.path())) {
            Ok(argv) => argv,
            Err(e) => {
                let outcome = rex_executor::ExecutionOutcome {
                    state: ExecutionState::Failure,
                    output: String::new(),
                    error: Some(e.to_string()),
                };
                return (outcome, started_at, Utc::now());
            }
        };

        let cwd = agent_config.add_dirs.first().cloned();
        let timeout = std::time::Duration::from_secs(rule.max_timeout_seconds as u64);
        let outcome = invoke(
            &self.exec.agent_path,
            rule.run_as_user.as_deref(),
            &argv,
            cwd.as_deref(),
            &agent_config.env_vars,
            timeout,
            cancel,
        )
        .await;
        (outcome, started_at, Utc::now())
    }

    async fn persist(
        &self,
        rule: &Rule,
        event: &Event,
        outcome: &rex_executor::ExecutionOutcome,
        retry_attempt: u32,
        started_at: chrono::DateTime<Utc>,
        finished_at: chrono::DateTime<Utc>,
    ) {
        let Some(history) = &self.history else { return };

        let event_data = sanitize(&serde_json::Value::Object(event.data.clone()).to_string());
        let event_data = truncate_chars(&event_data, EVENT_DATA_MAX_CHARS);
        let output = truncate_chars(&outcome.output, OUTPUT_MAX_CHARS);

        let rec = NewExecutionRecord {
            rule_name: rule.name.clone(),
            trigger_type: event.event_type.clone(),
            state: outcome.state,
            started_at,
            finished_at,
            duration_ms: (finished_at - started_at).num_milliseconds(),
            retry_attempt,
            triggered_by_execution_id: None,
            event_data,
            error: outcome.error.clone(),
            output,
            dry_run: rule.dry_run,
        };

        if let Err(e) = history.record(rec).await {
            tracing::warn!(rule = %rule.name, error = %e, "failed to record execution history");
        }
    }

    fn evaluate_chain(&self, rule: &Rule, event: &Event, output: &str) {
        let markers = chain::extract_markers(output);
        for marker in &markers {
            if !rule.triggers_rules.contains(marker) {
                tracing::debug!(rule = %rule.name, marker = %marker, "chain marker not in triggers_rules, ignored");
            }
        }

        for target in chain::resolve_targets(&rule.triggers_rules, &markers) {
            let chained = Event::new(target.to_string(), "triggered").with_data(event.data.clone());
            self.enqueue(chained);
        }
    }
}

fn should_retry(on_failure: &OnFailure, retry_attempt: u32) -> bool {
    on_failure.retry && retry_attempt < on_failure.attempts()
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
