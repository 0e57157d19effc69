//! The filesystem trigger: watches one or more directories and classifies
//! notify's raw OS events into `file_*`/`directory_*` event types.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use rex_core::{Event, FilesystemTrigger};
use tokio::sync::mpsc as tokio_mpsc;
use tokio_util::sync::CancellationToken;

use crate::{try_send, EventSender};

pub struct FilesystemSource {
    rule_name: String,
    config: FilesystemTrigger,
    run_as_user: Option<String>,
    watcher: Mutex<Option<RecommendedWatcher>>,
}

impl FilesystemSource {
    pub fn new(rule_name: String, config: FilesystemTrigger, run_as_user: Option<String>) -> Self {
        Self { rule_name, config, run_as_user, watcher: Mutex::new(None) }
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub async fn start(&self, cancel: CancellationToken, out: EventSender) {
        let home = user_home(self.run_as_user.as_deref());
        let watch_paths: Vec<PathBuf> = self
            .config
            .watch_paths
            .iter()
            .map(|p| PathBuf::from(rex_core::expand_tilde(p, home.as_deref())))
            .collect();

        let (raw_tx, mut raw_rx) = tokio_mpsc::channel::<notify::Result<notify::Event>>(256);
        let recursive_mode = if self.config.recursive { RecursiveMode::Recursive } else { RecursiveMode::NonRecursive };

        let mut watcher = match notify::recommended_watcher(move |res| {
            let _ = raw_tx.blocking_send(res);
        }) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(rule = %self.rule_name, error = %e, "failed to construct filesystem watcher");
                cancel.cancelled().await;
                return;
            }
        };

        for path in &watch_paths {
            if let Err(e) = watcher.watch(path, recursive_mode) {
                tracing::warn!(rule = %self.rule_name, path = %path.display(), error = %e, "failed to watch path");
            }
        }
        *self.watcher.lock() = Some(watcher);

        let debounce = Arc::new(Debouncer::new(Duration::from_secs(self.config.debounce_seconds)));
        let ignore_patterns = self.config.ignore_patterns.clone();

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                maybe = raw_rx.recv() => {
                    let Some(result) = maybe else { break };
                    match result {
                        Ok(event) => self.handle_raw_event(event, &watch_paths, &ignore_patterns, &debounce, &out),
                        Err(e) => {
                            tracing::warn!(rule = %self.rule_name, error = %e, "filesystem watcher overflow or error, dropping");
                        }
                    }
                }
            }
        }
    }

    pub async fn stop(&self) {
        *self.watcher.lock() = None;
    }

    fn handle_raw_event(
        &self,
        event: notify::Event,
        watch_paths: &[PathBuf],
        ignore_patterns: &[String],
        debounce: &Arc<Debouncer>,
        out: &EventSender,
    ) {
        let Some(event_type) = classify(&event) else { return };

        // `RenameMode::Both` carries [from, to]; only the destination side
        // is a create, the source side is the dropped "renamed-from".
        let paths: &[PathBuf] =
            if matches!(event.kind, EventKind::Modify(ModifyKind::Name(RenameMode::Both))) && event.paths.len() == 2 {
                &event.paths[1..]
            } else {
                &event.paths
            };

        for path in paths {
            if is_ignored(path, ignore_patterns) {
                continue;
            }
            if !self.config.recursive && !has_configured_parent(path, watch_paths) {
                continue;
            }
            if self.config.recursive && !has_configured_ancestor(path, watch_paths) {
                continue;
            }

            let is_dir = path.is_dir();
            let full_type = qualify(event_type, is_dir);

            if debounce.window().is_zero() {
                try_send(out, Event::new(self.rule_name.clone(), full_type));
                continue;
            }

            if debounce.first_in_window(path, full_type) {
                let out = out.clone();
                let rule_name = self.rule_name.clone();
                let debounce = Arc::clone(debounce);
                let path = path.clone();
                let window = debounce.window();
                tokio::spawn(async move {
                    tokio::time::sleep(window).await;
                    if let Some(emitted_type) = debounce.take(&path) {
                        try_send(&out, Event::new(rule_name, emitted_type));
                    }
                });
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawKind {
    Created,
    Modified,
    Removed,
}

fn classify(event: &notify::Event) -> Option<RawKind> {
    match event.kind {
        EventKind::Create(_) => Some(RawKind::Created),
        EventKind::Remove(_) => Some(RawKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => None,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(RawKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => Some(RawKind::Created),
        EventKind::Modify(_) => Some(RawKind::Modified),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}

fn qualify(kind: RawKind, is_dir: bool) -> &'static str {
    match (kind, is_dir) {
        (RawKind::Created, true) => "directory_created",
        (RawKind::Created, false) => "file_created",
        (RawKind::Modified, _) => "file_modified",
        (RawKind::Removed, true) => "directory_deleted",
        (RawKind::Removed, false) => "file_deleted",
    }
}

fn is_ignored(path: &Path, patterns: &[String]) -> bool {
    let Some(basename) = path.file_name().and_then(|n| n.to_str()) else { return false };
    patterns.iter().any(|pattern| glob::Pattern::new(pattern).map(|p| p.matches(basename)).unwrap_or(false))
}

fn has_configured_parent(path: &Path, watch_paths: &[PathBuf]) -> bool {
    path.parent().is_some_and(|parent| watch_paths.iter().any(|w| w == parent))
}

fn has_configured_ancestor(path: &Path, watch_paths: &[PathBuf]) -> bool {
    watch_paths.iter().any(|w| path.starts_with(w))
}

fn user_home(run_as_user: Option<&str>) -> Option<PathBuf> {
    rex_core::resolve_run_as_user_home(run_as_user, dirs::home_dir().as_deref())
}

/// Collapses rapid per-path bursts: the type of the first event observed
/// within the debounce window is the type eventually emitted, even when
/// later events for the same path arrive with a different type.
struct Debouncer {
    window: Duration,
    pending: Mutex<HashMap<PathBuf, &'static str>>,
}

impl Debouncer {
    fn new(window: Duration) -> Self {
        Self { window, pending: Mutex::new(HashMap::new()) }
    }

    fn window(&self) -> Duration {
        self.window
    }

    /// Records `kind` for `path` if nothing is already pending there.
    /// Returns true exactly when the caller should schedule the flush
    /// timer (i.e. this is the first event of a new burst).
    fn first_in_window(&self, path: &Path, kind: &'static str) -> bool {
        let mut pending = self.pending.lock();
        if pending.contains_key(path) {
            false
        } else {
            pending.insert(path.to_path_buf(), kind);
            true
        }
    }

    fn take(&self, path: &Path) -> Option<&'static str> {
        self.pending.lock().remove(path)
    }
}

#[cfg(test)]
#[path = "filesystem_tests.rs"]
mod tests;
