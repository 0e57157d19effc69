//! Shared data model, time abstraction, and text-safety primitives used
//! across the rule execution pipeline.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod clock;
mod id;
mod macros;
mod model;
mod sanitize;
mod severity;
mod template;

pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{EventId, HandlerId};
pub use model::{
    AgentConfig, DaemonConfig, Event, ExecutionRecord, ExecutionState, FilesystemTrigger,
    GlobalConfig, LifecycleTrigger, LogFormat, LoggingConfig, MemoryConfig, OnFailure, Rule,
    RuleExecutionConfig, ScheduledTrigger, Trigger, WebhookTrigger, DEFAULT_MAX_ACTIONS,
    DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_TIMEOUT_SECONDS, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_DELAY_SECONDS,
};
pub use sanitize::{sanitize, scrub_output};
pub use severity::{Severe, Severity};
pub use template::render as render_template;

/// Expand a leading `~` against the given home directory, mirroring shell
/// tilde expansion. Paths without a leading `~` are returned unchanged.
pub fn expand_tilde(path: &str, home: Option<&std::path::Path>) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home {
            return home.join(rest).to_string_lossy().into_owned();
        }
    } else if path == "~" {
        if let Some(home) = home {
            return home.to_string_lossy().into_owned();
        }
    }
    path.to_string()
}

/// Resolves the home directory `~` should expand against for a rule: the
/// `run_as_user` home when one is set and exists, else `daemon_home`. Used
/// by both the filesystem trigger's watch paths and the executor's
/// `add_dirs`, so a rule's `~` always means the same directory regardless
/// of which one is expanding it.
pub fn resolve_run_as_user_home(run_as_user: Option<&str>, daemon_home: Option<&std::path::Path>) -> Option<std::path::PathBuf> {
    if let Some(user) = run_as_user {
        if let Some(home) = home_for_user(user) {
            return Some(home);
        }
    }
    daemon_home.map(|p| p.to_path_buf())
}

#[cfg(unix)]
fn home_for_user(user: &str) -> Option<std::path::PathBuf> {
    let candidate = std::path::PathBuf::from("/home").join(user);
    candidate.is_dir().then_some(candidate)
}

#[cfg(not(unix))]
fn home_for_user(_user: &str) -> Option<std::path::PathBuf> {
    None
}

#[cfg(test)]
mod lib_tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn expands_tilde_against_home() {
        assert_eq!(expand_tilde("~/x", Some(Path::new("/home/u"))), "/home/u/x");
    }

    #[test]
    fn leaves_non_tilde_paths_unchanged() {
        assert_eq!(expand_tilde("/abs/x", Some(Path::new("/home/u"))), "/abs/x");
    }

    #[test]
    fn leaves_tilde_unexpanded_without_home() {
        assert_eq!(expand_tilde("~/x", None), "~/x");
    }
}
