use std::time::Duration;

use rex_core::{ScheduledTrigger, Trigger, WebhookTrigger};
use crate::dispatcher::test_support::{manual_rule, test_dispatcher};
use tokio_util::sync::CancellationToken;

use super::*;

fn webhook_rule(name: &str, listen_path: &str) -> Rule {
    let mut rule = manual_rule(name);
    rule.trigger = Trigger::Webhook(WebhookTrigger { listen_path: listen_path.to_string(), ..Default::default() });
    rule
}

fn scheduled_rule(name: &str, cron: &str) -> Rule {
    let mut rule = manual_rule(name);
    rule.trigger = Trigger::Scheduled(ScheduledTrigger { cron_expression: Some(cron.to_string()), ..Default::default() });
    rule
}

#[tokio::test]
async fn reload_starts_trigger_for_brand_new_rule() {
    let dispatcher = test_dispatcher(vec![]);
    let cancel = CancellationToken::new();

    dispatcher.reload_rules(vec![webhook_rule("hook", "/hooks/a")], &cancel).await;

    assert_eq!(dispatcher.rules.read().len(), 1);
    assert!(dispatcher.triggers.read().contains_key("hook"));
    assert!(dispatcher.webhooks.read().contains_key("/hooks/a"));
}

#[tokio::test]
async fn reload_stops_trigger_for_removed_rule() {
    let dispatcher = test_dispatcher(vec![]);
    let cancel = CancellationToken::new();
    dispatcher.reload_rules(vec![webhook_rule("hook", "/hooks/a")], &cancel).await;
    assert!(dispatcher.triggers.read().contains_key("hook"));

    dispatcher.reload_rules(vec![], &cancel).await;

    assert!(dispatcher.rules.read().is_empty());
    assert!(!dispatcher.triggers.read().contains_key("hook"));
    assert!(!dispatcher.webhooks.read().contains_key("/hooks/a"));
}

#[tokio::test]
async fn reload_replaces_trigger_when_trigger_affecting_field_changes() {
    let dispatcher = test_dispatcher(vec![]);
    let cancel = CancellationToken::new();
    dispatcher.reload_rules(vec![scheduled_rule("tick", "0 * * * * *")], &cancel).await;

    dispatcher.reload_rules(vec![scheduled_rule("tick", "0 0 * * * *")], &cancel).await;

    let rules = dispatcher.rules.read();
    let rule = rules.iter().find(|r| r.name == "tick").expect("rule retained");
    match &rule.trigger {
        Trigger::Scheduled(cfg) => assert_eq!(cfg.cron_expression.as_deref(), Some("0 0 * * * *")),
        _ => panic!("expected scheduled trigger"),
    }
}

#[tokio::test]
async fn reload_leaves_trigger_alone_when_only_non_trigger_fields_change() {
    let dispatcher = test_dispatcher(vec![]);
    let cancel = CancellationToken::new();
    dispatcher.reload_rules(vec![webhook_rule("hook", "/hooks/a")], &cancel).await;

    let mut changed = webhook_rule("hook", "/hooks/a");
    changed.action_prompt = "a different prompt".to_string();
    dispatcher.reload_rules(vec![changed], &cancel).await;

    let rules = dispatcher.rules.read();
    assert_eq!(rules.iter().find(|r| r.name == "hook").expect("rule retained").action_prompt, "a different prompt");
}

#[tokio::test]
async fn reload_tears_down_trigger_when_rule_disabled_but_keeps_entry() {
    let dispatcher = test_dispatcher(vec![]);
    let cancel = CancellationToken::new();
    dispatcher.reload_rules(vec![webhook_rule("hook", "/hooks/a")], &cancel).await;

    let mut disabled = webhook_rule("hook", "/hooks/a");
    disabled.enabled = false;
    dispatcher.reload_rules(vec![disabled], &cancel).await;

    assert_eq!(dispatcher.rules.read().len(), 1);
    assert!(!dispatcher.triggers.read().contains_key("hook"));
}

#[tokio::test]
async fn reload_starts_trigger_when_rule_re_enabled() {
    let dispatcher = test_dispatcher(vec![]);
    let cancel = CancellationToken::new();
    let mut disabled = webhook_rule("hook", "/hooks/a");
    disabled.enabled = false;
    dispatcher.reload_rules(vec![disabled], &cancel).await;
    assert!(!dispatcher.triggers.read().contains_key("hook"));

    dispatcher.reload_rules(vec![webhook_rule("hook", "/hooks/a")], &cancel).await;

    assert!(dispatcher.triggers.read().contains_key("hook"));
    tokio::time::sleep(Duration::from_millis(1)).await;
}
