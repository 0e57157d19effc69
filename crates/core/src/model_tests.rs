use super::*;

fn defaults() -> AgentConfig {
    AgentConfig {
        model: Some("claude-default".to_string()),
        allowed_tools: vec!["Read".to_string()],
        disallowed_tools: vec![],
        add_dirs: vec!["/default".to_string()],
        permission_mode: Some("default".to_string()),
        max_budget_usd: Some(5.0),
        system_prompt: Some("be helpful".to_string()),
        append_system_prompt: None,
        mcp_config: vec!["/etc/mcp.json".to_string()],
        env_vars: HashMap::from([("A".to_string(), "1".to_string())]),
        memory: Some(true),
    }
}

#[test]
fn empty_rule_fields_fall_back_to_defaults() {
    let rule = AgentConfig::default();
    let merged = rule.merge(&defaults());
    assert_eq!(merged, defaults());
}

#[test]
fn non_empty_rule_fields_win_outright() {
    let rule = AgentConfig { model: Some("claude-override".to_string()), ..Default::default() };
    let merged = rule.merge(&defaults());
    assert_eq!(merged.model, Some("claude-override".to_string()));
    assert_eq!(merged.allowed_tools, defaults().allowed_tools);
}

#[test]
fn zero_budget_falls_back_to_default() {
    let rule = AgentConfig { max_budget_usd: Some(0.0), ..Default::default() };
    let merged = rule.merge(&defaults());
    assert_eq!(merged.max_budget_usd, Some(5.0));
}

#[test]
fn env_vars_merge_key_wise_with_rule_precedence() {
    let rule = AgentConfig {
        env_vars: HashMap::from([("A".to_string(), "override".to_string()), ("B".to_string(), "2".to_string())]),
        ..Default::default()
    };
    let merged = rule.merge(&defaults());
    assert_eq!(merged.env_vars.get("A"), Some(&"override".to_string()));
    assert_eq!(merged.env_vars.get("B"), Some(&"2".to_string()));
}

#[test]
fn memory_tri_state_inherits_when_unset() {
    let rule = AgentConfig::default();
    assert_eq!(rule.merge(&defaults()).memory, Some(true));

    let rule = AgentConfig { memory: Some(false), ..Default::default() };
    assert_eq!(rule.merge(&defaults()).memory, Some(false));
}

#[test]
fn event_enrich_fills_only_missing_keys() {
    let mut event = Event::new("rule-a", "file_created");
    event.data.insert("event_type".to_string(), serde_json::Value::String("custom".to_string()));
    event.enrich();
    assert_eq!(event.data.get("event_type").and_then(|v| v.as_str()), Some("custom"));
    assert!(event.data.contains_key("timestamp"));
}

#[test]
fn on_failure_attempts_defaults_to_three_when_retry_enabled() {
    let of = OnFailure { retry: true, retry_attempts: 0, retry_delay_seconds: 0 };
    assert_eq!(of.attempts(), 3);
    assert_eq!(of.delay_seconds(), 30);
}
