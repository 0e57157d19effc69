//! Debounced directory watch over the rules directory, driving the
//! dispatcher's differential trigger restart on every settled batch of
//! `.yaml`/`.yml` changes (§4.8).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{EventKind, RecursiveMode, Watcher};
use rex_core::GlobalConfig;
use rex_rules::{load_rules_dir, validate_directory_permissions};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::Dispatcher;

/// Quiet period after the last observed change before a reload is
/// triggered: the timer resets on every new event (§4.8).
const DEBOUNCE: Duration = Duration::from_secs(1);

/// Runs until `cancel` fires. `parent_cancel` is the token new trigger
/// tasks are spawned as children of, distinct from this watcher's own
/// cancellation so a hot-reload watcher failure never tears down running
/// rule triggers.
pub async fn run(
    rules_dir: PathBuf,
    global: GlobalConfig,
    dispatcher: Arc<Dispatcher>,
    parent_cancel: CancellationToken,
    cancel: CancellationToken,
    mut force_rx: mpsc::Receiver<()>,
) {
    let (raw_tx, mut raw_rx) = mpsc::channel::<notify::Result<notify::Event>>(64);
    let mut watcher = match notify::recommended_watcher(move |res| {
        let _ = raw_tx.blocking_send(res);
    }) {
        Ok(w) => w,
        Err(e) => {
            tracing::error!(error = %e, "failed to start hot-reload watcher, rule changes will not be picked up");
            cancel.cancelled().await;
            return;
        }
    };

    if let Err(e) = watcher.watch(&rules_dir, RecursiveMode::NonRecursive) {
        tracing::error!(path = %rules_dir.display(), error = %e, "failed to watch rules directory for hot-reload");
        cancel.cancelled().await;
        return;
    }

    let mut debounce_deadline: Option<tokio::time::Instant> = None;

    loop {
        let sleep = match debounce_deadline {
            Some(deadline) => tokio::time::sleep_until(deadline),
            None => tokio::time::sleep(Duration::from_secs(3600)),
        };
        tokio::pin!(sleep);

        tokio::select! {
            _ = cancel.cancelled() => break,
            () = &mut sleep, if debounce_deadline.is_some() => {
                debounce_deadline = None;
                reload_once(&rules_dir, &global, &dispatcher, &parent_cancel).await;
            }
            maybe = raw_rx.recv() => {
                match maybe {
                    Some(Ok(event)) if is_rule_document_event(&event) => {
                        debounce_deadline = Some(tokio::time::Instant::now() + DEBOUNCE);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => tracing::warn!(error = %e, "hot-reload watcher error"),
                    None => break,
                }
            }
            forced = force_rx.recv() => {
                match forced {
                    Some(()) => {
                        tracing::info!("hot-reload: forced reload requested");
                        debounce_deadline = None;
                        reload_once(&rules_dir, &global, &dispatcher, &parent_cancel).await;
                    }
                    None => break,
                }
            }
        }
    }

    let _ = watcher.unwatch(&rules_dir);
}

/// Re-validates the directory's current contents — including the same
/// directory-permission and allowlist checks used at startup — and, if
/// safe, computes and applies the differential trigger restart. Unsafe
/// permissions abort the reload with a critical log; existing state is
/// kept (§4.8).
async fn reload_once(rules_dir: &Path, global: &GlobalConfig, dispatcher: &Arc<Dispatcher>, parent_cancel: &CancellationToken) {
    if let Err(e) = validate_directory_permissions(rules_dir) {
        tracing::error!(error = %e, "rules directory has unsafe permissions, reload aborted, previous rule set kept");
        return;
    }

    let result = match load_rules_dir(rules_dir, global) {
        Ok(result) => result,
        Err(e) => {
            tracing::error!(error = %e, "failed to read rules directory during reload, previous rule set kept");
            return;
        }
    };

    for (path, err) in &result.errors {
        tracing::warn!(path = %path.display(), error = %err, "rule document failed validation during reload, skipped");
    }

    tracing::info!(rules_loaded = result.rules.len(), "hot-reload: applying new rule set");
    dispatcher.reload_rules(result.rules, parent_cancel).await;
}

fn is_rule_document_event(event: &notify::Event) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)) {
        return false;
    }
    event.paths.iter().any(|p| matches!(p.extension().and_then(|e| e.to_str()), Some("yaml") | Some("yml")))
}
