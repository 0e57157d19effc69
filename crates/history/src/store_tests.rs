use chrono::Utc;

use super::*;

fn sample(rule_name: &str, state: ExecutionState) -> NewExecutionRecord {
    let now = Utc::now();
    NewExecutionRecord {
        rule_name: rule_name.to_string(),
        trigger_type: "manual".to_string(),
        state,
        started_at: now,
        finished_at: now,
        duration_ms: 12,
        retry_attempt: 0,
        triggered_by_execution_id: None,
        event_data: "{}".to_string(),
        error: None,
        output: "ok".to_string(),
        dry_run: false,
    }
}

#[tokio::test]
async fn record_assigns_increasing_ids() {
    let store = HistoryStore::open_in_memory().unwrap();
    let first = store.record(sample("r1", ExecutionState::Success)).await.unwrap();
    let second = store.record(sample("r1", ExecutionState::Success)).await.unwrap();
    assert!(second > first);
}

#[tokio::test]
async fn history_orders_newest_first_and_respects_limit() {
    let store = HistoryStore::open_in_memory().unwrap();
    for _ in 0..5 {
        store.record(sample("r1", ExecutionState::Success)).await.unwrap();
    }
    let records = store.history(None, None, 3).await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records[0].id > records[1].id);
}

#[tokio::test]
async fn history_filters_by_rule_name_and_state() {
    let store = HistoryStore::open_in_memory().unwrap();
    store.record(sample("r1", ExecutionState::Success)).await.unwrap();
    store.record(sample("r1", ExecutionState::Failure)).await.unwrap();
    store.record(sample("r2", ExecutionState::Failure)).await.unwrap();

    let by_rule = store.history(Some("r1".to_string()), None, 50).await.unwrap();
    assert_eq!(by_rule.len(), 2);

    let by_state = store.history(None, Some(ExecutionState::Failure), 50).await.unwrap();
    assert_eq!(by_state.len(), 2);

    let by_both = store.history(Some("r1".to_string()), Some(ExecutionState::Failure), 50).await.unwrap();
    assert_eq!(by_both.len(), 1);
}

#[tokio::test]
async fn last_state_reflects_most_recent_record() {
    let store = HistoryStore::open_in_memory().unwrap();
    assert_eq!(store.last_state("r1".to_string()).await.unwrap(), None);
    store.record(sample("r1", ExecutionState::Success)).await.unwrap();
    store.record(sample("r1", ExecutionState::Failure)).await.unwrap();
    assert_eq!(store.last_state("r1".to_string()).await.unwrap(), Some("failure".to_string()));
}

#[tokio::test]
async fn cleanup_deletes_records_older_than_retention() {
    let store = HistoryStore::open_in_memory().unwrap();
    {
        let conn = store.conn.lock();
        conn.execute(
            "INSERT INTO execution_history
             (rule_name, trigger_type, state, started_at, finished_at, duration_ms, retry_attempt,
              triggered_by_execution_id, event_data, error, output, dry_run)
             VALUES ('old', 'manual', 'success', '2000-01-01T00:00:00Z', '2000-01-01T00:00:00Z', 1, 0,
                     NULL, '{}', NULL, 'ok', 0)",
            [],
        )
        .unwrap();
    }
    store.record(sample("recent", ExecutionState::Success)).await.unwrap();

    let deleted = store.cleanup(90).await.unwrap();
    assert_eq!(deleted, 1);
    let remaining = store.history(None, None, 50).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].rule_name, "recent");
}

#[tokio::test]
async fn open_creates_parent_directories_and_persists_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("history.sqlite3");
    let store = HistoryStore::open(&path).unwrap();
    assert!(path.exists());
    let version: i64 = store.conn.lock().query_row("SELECT version FROM schema_version", [], |row| row.get(0)).unwrap();
    assert_eq!(version, SCHEMA_VERSION);
}
