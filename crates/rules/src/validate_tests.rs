use rex_core::GlobalConfig;

use super::*;

fn raw(yaml: &str) -> RawRule {
    serde_yaml::from_str(yaml).unwrap()
}

const BASE: &str = r#"
name: greet
trigger:
  type: manual
action:
  prompt: "hi"
"#;

#[test]
fn missing_name_is_rejected() {
    let r = raw("trigger:\n  type: manual\naction:\n  prompt: hi\n");
    let err = validate_rule(r, &GlobalConfig::default()).unwrap_err();
    assert!(matches!(err, RuleError::MissingName));
}

#[test]
fn missing_action_prompt_is_rejected() {
    let r = raw("name: greet\ntrigger:\n  type: manual\n");
    let err = validate_rule(r, &GlobalConfig::default()).unwrap_err();
    assert!(matches!(err, RuleError::MissingActionPrompt));
}

#[test]
fn unknown_trigger_type_is_rejected() {
    let r = raw("name: greet\ntrigger:\n  type: telepathy\naction:\n  prompt: hi\n");
    let err = validate_rule(r, &GlobalConfig::default()).unwrap_err();
    assert!(matches!(err, RuleError::UnknownTriggerType(t) if t == "telepathy"));
}

#[test]
fn filesystem_without_watch_paths_is_rejected() {
    let yaml = format!("{BASE}\n").replace("type: manual", "type: filesystem");
    let err = validate_rule(raw(&yaml), &GlobalConfig::default()).unwrap_err();
    assert!(matches!(err, RuleError::FilesystemMissingWatchPaths));
}

#[test]
fn scheduled_without_expression_mentions_cron_expression() {
    let yaml = BASE.replace("type: manual", "type: scheduled");
    let err = validate_rule(raw(&yaml), &GlobalConfig::default()).unwrap_err();
    assert!(matches!(err, RuleError::ScheduledMissingExpression));
    assert!(err.to_string().contains("cron_expression"));
}

#[test]
fn scheduled_rejects_ambiguous_expression() {
    let yaml = r#"
name: greet
trigger:
  type: scheduled
  cron_expression: "0 0 * * * *"
  run_every: "5m"
action:
  prompt: hi
"#;
    let err = validate_rule(raw(yaml), &GlobalConfig::default()).unwrap_err();
    assert!(matches!(err, RuleError::ScheduledAmbiguousExpression));
}

#[test]
fn webhook_listen_path_must_start_with_slash() {
    let yaml = r#"
name: hook
trigger:
  type: webhook
  listen_path: "no-leading-slash"
action:
  prompt: hi
"#;
    let err = validate_rule(raw(yaml), &GlobalConfig::default()).unwrap_err();
    assert!(matches!(err, RuleError::WebhookListenPathMustStartWithSlash));
    assert!(err.to_string().contains("must start with"));
}

#[test]
fn lifecycle_without_on_events_is_rejected() {
    let yaml = BASE.replace("type: manual", "type: lifecycle");
    let err = validate_rule(raw(&yaml), &GlobalConfig::default()).unwrap_err();
    assert!(matches!(err, RuleError::LifecycleMissingOnEvents));
}

#[test]
fn run_as_user_root_is_always_rejected() {
    let yaml = BASE.replace("name: greet", "name: greet\nrun_as_user: root");
    let err = validate_rule(raw(&yaml), &GlobalConfig::default()).unwrap_err();
    assert!(matches!(err, RuleError::RunAsUserIsRoot));
}

#[test]
fn permission_mode_bypass_is_always_rejected() {
    let yaml = format!("{BASE}\nagent_config:\n  permission_mode: bypassPermissions\n");
    let err = validate_rule(raw(&yaml), &GlobalConfig::default()).unwrap_err();
    assert!(matches!(err, RuleError::PermissionModeBypass));
}

#[test]
fn max_timeout_seconds_boundaries() {
    for (value, should_fail) in [(1, false), (3600, false), (3601, true), (-1, true)] {
        let yaml = format!("{BASE}\nmax_timeout_seconds: {value}\n");
        let result = validate_rule(raw(&yaml), &GlobalConfig::default());
        assert_eq!(result.is_err(), should_fail, "value={value}");
    }
}

#[test]
fn zero_max_timeout_seconds_uses_default() {
    let yaml = format!("{BASE}\nmax_timeout_seconds: 0\n");
    let rule = validate_rule(raw(&yaml), &GlobalConfig::default()).unwrap();
    assert_eq!(rule.max_timeout_seconds, rex_core::DEFAULT_MAX_TIMEOUT_SECONDS);
}

#[test]
fn retry_without_attempts_defaults_to_three() {
    let yaml = format!("{BASE}\non_failure:\n  retry: true\n");
    let rule = validate_rule(raw(&yaml), &GlobalConfig::default()).unwrap();
    assert_eq!(rule.on_failure.retry_attempts, rex_core::DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn cron_expression_accepts_five_and_six_fields() {
    for expr in ["0 * * * *", "0 0 * * * *"] {
        let yaml = format!(
            "name: greet\ntrigger:\n  type: scheduled\n  cron_expression: \"{expr}\"\naction:\n  prompt: hi\n"
        );
        assert!(validate_rule(raw(&yaml), &GlobalConfig::default()).is_ok());
    }
}
