use rex_core::{Severe, Severity};
use thiserror::Error;

/// Per-document validation failure. Every variant names the offending
/// field so the loader can surface a descriptive message without the
/// caller re-parsing the string.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("document could not be parsed as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error reading rule document: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing required field `name`")]
    MissingName,

    #[error("missing required field `action.prompt`")]
    MissingActionPrompt,

    #[error("missing required field `trigger.type`")]
    MissingTriggerType,

    #[error("unknown trigger type `{0}`")]
    UnknownTriggerType(String),

    #[error("filesystem trigger missing required field `watch_paths`")]
    FilesystemMissingWatchPaths,

    #[error("scheduled trigger missing schedule expression (set `cron_expression`, `run_every`, or `run_at`)")]
    ScheduledMissingExpression,

    #[error("scheduled trigger must define exactly one of `cron_expression`, `run_every`, `run_at`")]
    ScheduledAmbiguousExpression,

    #[error("webhook trigger missing required field `listen_path`")]
    WebhookMissingListenPath,

    #[error("webhook `listen_path` must start with `/`")]
    WebhookListenPathMustStartWithSlash,

    #[error("lifecycle trigger missing required field `on_events`")]
    LifecycleMissingOnEvents,

    #[error("`run_as_user` must not be `root`")]
    RunAsUserIsRoot,

    #[error("`permission_mode` must not be `bypassPermissions`")]
    PermissionModeBypass,

    #[error("`run_as_user` `{0}` is not in the configured `allowed_run_as_users` allowlist")]
    RunAsUserNotAllowed(String),

    #[error("`max_timeout_seconds` must be between 1 and 3600, got {0}")]
    MaxTimeoutSecondsOutOfRange(i64),

    #[error("rules directory `{0}` has unsafe permissions (must not be world-writable, and no more permissive than 0750)")]
    UnsafeDirectoryPermissions(std::path::PathBuf),
}

impl Severe for RuleError {
    fn severity(&self) -> Severity {
        Severity::Configuration
    }
}
