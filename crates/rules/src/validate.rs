//! Per-document validation: turns a [`RawRule`] plus the active
//! [`GlobalConfig`] into a fully-defaulted [`Rule`], or a descriptive
//! [`RuleError`].

use rex_core::{
    FilesystemTrigger, GlobalConfig, LifecycleTrigger, Rule, ScheduledTrigger, Trigger,
    WebhookTrigger, DEFAULT_MAX_ACTIONS, DEFAULT_MAX_TIMEOUT_SECONDS, DEFAULT_RETRY_ATTEMPTS,
};

use crate::error::RuleError;
use crate::raw::RawRule;

pub fn validate_rule(raw: RawRule, global: &GlobalConfig) -> Result<Rule, RuleError> {
    let name = raw.name.filter(|n| !n.is_empty()).ok_or(RuleError::MissingName)?;

    let prompt = raw
        .action
        .and_then(|a| a.prompt)
        .filter(|p| !p.is_empty())
        .ok_or(RuleError::MissingActionPrompt)?;

    let trigger = validate_trigger(raw.trigger)?;

    if let Some(user) = raw.run_as_user.as_deref() {
        if user == "root" {
            return Err(RuleError::RunAsUserIsRoot);
        }
        if !global.daemon.allowed_run_as_users.is_empty()
            && !global.daemon.allowed_run_as_users.iter().any(|u| u == user)
        {
            return Err(RuleError::RunAsUserNotAllowed(user.to_string()));
        }
    }

    let agent_config = raw.agent_config.unwrap_or_default();
    if agent_config.permission_mode.as_deref() == Some("bypassPermissions") {
        return Err(RuleError::PermissionModeBypass);
    }
    let max_timeout_seconds = match raw.max_timeout_seconds {
        None | Some(0) => DEFAULT_MAX_TIMEOUT_SECONDS,
        Some(v) if v < 0 || v > 3600 => return Err(RuleError::MaxTimeoutSecondsOutOfRange(v)),
        Some(v) => v as u32,
    };

    let max_actions = match raw.max_actions {
        None | Some(0) => DEFAULT_MAX_ACTIONS,
        Some(v) if v < 0 => DEFAULT_MAX_ACTIONS,
        Some(v) => v as u32,
    };

    let mut on_failure = raw.on_failure.unwrap_or_default();
    if on_failure.retry && on_failure.retry_attempts == 0 {
        on_failure.retry_attempts = DEFAULT_RETRY_ATTEMPTS;
    }

    Ok(Rule {
        name,
        description: raw.description,
        enabled: raw.enabled.unwrap_or(false),
        run_as_user: raw.run_as_user,
        trigger,
        action_prompt: prompt,
        agent_config,
        dry_run: raw.dry_run.unwrap_or(false),
        depends_on_rules: raw.depends_on_rules.unwrap_or_default(),
        triggers_rules: raw.triggers_rules.unwrap_or_default(),
        on_failure,
        max_timeout_seconds,
        max_actions,
    })
}

fn validate_trigger(raw: Option<serde_yaml::Value>) -> Result<Trigger, RuleError> {
    let value = raw.ok_or(RuleError::MissingTriggerType)?;
    let mapping = value.as_mapping().ok_or(RuleError::MissingTriggerType)?;
    let kind = mapping
        .get(serde_yaml::Value::String("type".to_string()))
        .and_then(|v| v.as_str())
        .ok_or(RuleError::MissingTriggerType)?;

    match kind {
        "filesystem" => {
            let fs: FilesystemTrigger = serde_yaml::from_value(value).unwrap_or_default();
            if fs.watch_paths.is_empty() {
                return Err(RuleError::FilesystemMissingWatchPaths);
            }
            Ok(Trigger::Filesystem(fs))
        }
        "scheduled" => {
            let sched: ScheduledTrigger = serde_yaml::from_value(value).unwrap_or_default();
            let set_count = [&sched.cron_expression, &sched.run_every, &sched.run_at]
                .into_iter()
                .filter(|f| f.is_some())
                .count();
            if set_count == 0 {
                return Err(RuleError::ScheduledMissingExpression);
            }
            if set_count > 1 {
                return Err(RuleError::ScheduledAmbiguousExpression);
            }
            Ok(Trigger::Scheduled(sched))
        }
        "webhook" => {
            let hook: WebhookTrigger = serde_yaml::from_value(value).unwrap_or_default();
            if hook.listen_path.is_empty() {
                return Err(RuleError::WebhookMissingListenPath);
            }
            if !hook.listen_path.starts_with('/') {
                return Err(RuleError::WebhookListenPathMustStartWithSlash);
            }
            Ok(Trigger::Webhook(hook))
        }
        "lifecycle" => {
            let lifecycle: LifecycleTrigger = serde_yaml::from_value(value).unwrap_or_default();
            if lifecycle.on_events.is_empty() {
                return Err(RuleError::LifecycleMissingOnEvents);
            }
            Ok(Trigger::Lifecycle(lifecycle))
        }
        "manual" => Ok(Trigger::Manual),
        other => Err(RuleError::UnknownTriggerType(other.to_string())),
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
