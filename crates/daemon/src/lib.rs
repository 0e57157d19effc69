//! Wires rule/config loading, the dispatcher, the HTTP surface, and the
//! hot-reload watcher into a single daemon lifecycle: start, run, shutdown.

mod dispatcher;
mod error;
mod hot_reload;
pub mod logging;
mod paths;

pub use dispatcher::{Dispatcher, ExecContext, InFlight};
pub use error::DaemonError;
pub use paths::{ensure_dir, DataLayout};

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rex_core::{Event, GlobalConfig, Rule, SystemClock};
use rex_history::HistoryStore;
use rex_http::AppState;
use rex_rules::{load_global_config, load_rules_dir, validate_directory_permissions};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;

const HISTORY_RETENTION_DAYS: i64 = 90;
const EVENT_CHANNEL_CAPACITY: usize = 100;
const HEALTH_RATE_PER_MINUTE: u32 = 60;
const RULES_RATE_PER_MINUTE: u32 = 30;
const HISTORY_RATE_PER_MINUTE: u32 = 30;
const WEBHOOK_RATE_PER_MINUTE: u32 = 10;

/// Everything a running daemon holds onto for the lifetime of the process.
pub struct Daemon {
    layout: DataLayout,
    global: GlobalConfig,
    dispatcher: Arc<Dispatcher>,
    event_rx: mpsc::Receiver<Event>,
    _log_guard: WorkerGuard,
}

impl Daemon {
    /// Loads the global config and rules directory, opens (or degrades
    /// without) history, and builds the dispatcher — but does not yet
    /// start triggers, the HTTP listener, or the hot-reload watcher. Fatal
    /// at this stage means the process should exit non-zero (§7).
    pub fn bootstrap(data_dir: std::path::PathBuf, foreground: bool, daemon_exe: Option<std::path::PathBuf>) -> Result<Self, DaemonError> {
        let layout = DataLayout::new(data_dir);
        ensure_dir(&layout.data_dir).map_err(|e| DaemonError::ConfigRead(layout.config_path(), e))?;

        let global = if layout.config_path().exists() {
            load_global_config(&layout.config_path())?
        } else {
            GlobalConfig::default()
        };

        let log_guard = logging::setup_logging(&global.logging, &layout.log_path(), foreground)?;

        let rules_dir = layout.rules_dir();
        if !rules_dir.exists() {
            return Err(DaemonError::RulesDirMissing(rules_dir));
        }
        validate_directory_permissions(&rules_dir)?;

        let load_result = load_rules_dir(&rules_dir, &global)?;
        for (path, err) in &load_result.errors {
            tracing::error!(path = %path.display(), error = %err, "rule document failed validation, skipped");
        }
        tracing::info!(rules_loaded = load_result.rules.len(), "rules directory loaded");

        let history = match HistoryStore::open(&layout.history_db_path()) {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to open history store, continuing without persisted history");
                None
            }
        };

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let rules = Arc::new(RwLock::new(load_result.rules));
        let webhooks = Arc::new(RwLock::new(HashMap::new()));
        let last_run_state = Arc::new(Mutex::new(HashMap::new()));

        let exec = ExecContext {
            agent_path: global.daemon.agent_path.clone(),
            debug: global.logging.debug,
            agent_defaults: global.agent_defaults.clone(),
            memory_enabled: global.memory.enabled,
            memory_path: global.memory.path.clone(),
            daemon_exe,
            home_dir: dirs::home_dir(),
        };

        let dispatcher = Dispatcher::new(rules, webhooks, last_run_state, event_tx, history, global.rule_execution.max_concurrent, exec);

        Ok(Self { layout, global, dispatcher, event_rx, _log_guard: log_guard })
    }

    /// Runs the daemon to completion: starts triggers, the HTTP listener,
    /// and the hot-reload watcher, fans `daemon_started` out, then drives
    /// the event loop until `cancel` fires, at which point it runs the
    /// shutdown sequence described in §4.9 and returns.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), DaemonError> {
        let Daemon { layout, global, dispatcher, event_rx, _log_guard } = self;

        dispatcher.start_all_triggers(&cancel).await;

        if let Some(history) = dispatcher.history_handle() {
            tokio::spawn(async move {
                match history.cleanup(HISTORY_RETENTION_DAYS).await {
                    Ok(deleted) => tracing::info!(deleted, "history cleanup complete"),
                    Err(e) => tracing::warn!(error = %e, "history cleanup failed"),
                }
            });
        }

        let (reload_tx, reload_rx) = mpsc::channel(1);

        let http_state = AppState {
            rules: dispatcher.rules_handle(),
            webhooks: dispatcher.webhooks_handle(),
            last_run_state: dispatcher.last_run_state_handle(),
            event_tx: dispatcher.event_sender(),
            history: dispatcher.history_handle(),
            reload_tx,
            started_at: std::time::Instant::now(),
            health_limiter: Arc::new(rex_http::RateLimiter::new(SystemClock, HEALTH_RATE_PER_MINUTE)),
            rules_limiter: Arc::new(rex_http::RateLimiter::new(SystemClock, RULES_RATE_PER_MINUTE)),
            history_limiter: Arc::new(rex_http::RateLimiter::new(SystemClock, HISTORY_RATE_PER_MINUTE)),
            webhook_limiter: Arc::new(rex_http::RateLimiter::new(SystemClock, WEBHOOK_RATE_PER_MINUTE)),
            clock: SystemClock,
        };

        let http_cancel = cancel.child_token();
        let host = global.daemon.host.clone();
        let port = global.daemon.port;
        let http_handle = tokio::spawn(async move {
            if let Err(e) = rex_http::serve(&host, port, http_state, http_cancel).await {
                tracing::error!(error = %e, "http listener exited with error");
            }
        });

        let reload_cancel = cancel.child_token();
        let reload_handle = tokio::spawn(hot_reload::run(
            layout.rules_dir(),
            global,
            Arc::clone(&dispatcher),
            cancel.clone(),
            reload_cancel,
            reload_rx,
        ));

        dispatcher.fire_lifecycle_via_channel("daemon_started");

        Arc::clone(&dispatcher).run_event_loop(event_rx, cancel.clone()).await;

        // The event loop has stopped reading the channel, so the
        // `daemon_stopped` lifecycle rule must be invoked directly on a
        // fresh bounded-timeout scope rather than enqueued — reusing the
        // cancelled scope would make it a no-op.
        let shutdown_scope = CancellationToken::new();
        let shutdown_timeout = shutdown_scope.clone();
        let timeout_handle = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            shutdown_timeout.cancel();
        });
        dispatcher.fire_lifecycle_direct("daemon_stopped", shutdown_scope.clone()).await;
        shutdown_scope.cancel();
        timeout_handle.abort();

        let _ = http_handle.await;
        let _ = reload_handle.await;

        Ok(())
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.dispatcher.rules_handle().read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_layout_paths_are_rooted_under_data_dir() {
        let layout = DataLayout::new("/var/lib/rex");
        assert_eq!(layout.config_path(), std::path::PathBuf::from("/var/lib/rex/config.yaml"));
        assert_eq!(layout.rules_dir(), std::path::PathBuf::from("/var/lib/rex/rules"));
        assert_eq!(layout.history_db_path(), std::path::PathBuf::from("/var/lib/rex/state/history.db"));
        assert_eq!(layout.log_path(), std::path::PathBuf::from("/var/lib/rex/logs/daemon.log"));
    }
}
