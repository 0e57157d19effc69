use tokio::sync::mpsc;

use super::*;

#[tokio::test(start_paused = true)]
async fn ticks_at_the_configured_interval_until_cancelled() {
    let config = ScheduledTrigger { cron_expression: None, run_every: Some("1m".to_string()), run_at: None };
    let source = ScheduledSource::new("tick".to_string(), &config).unwrap();

    let (tx, mut rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let cancel_for_task = cancel.clone();
    let handle = tokio::spawn(async move { source.start(cancel_for_task, tx).await });

    tokio::time::advance(std::time::Duration::from_secs(60)).await;
    let event = rx.recv().await.unwrap();
    assert_eq!(event.event_type, "scheduled");
    assert_eq!(event.rule_name, "tick");

    cancel.cancel();
    handle.await.unwrap();
}

#[test]
fn construction_fails_on_invalid_cron_expression() {
    let config =
        ScheduledTrigger { cron_expression: Some("not a cron".to_string()), run_every: None, run_at: None };
    assert!(ScheduledSource::new("bad".to_string(), &config).is_err());
}
