//! An embedded relational store for execution history. Every blocking
//! rusqlite call runs through `spawn_blocking`; the connection itself is
//! confined behind a `parking_lot::Mutex` so the async handle stays `Sync`.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rex_core::{ExecutionRecord, ExecutionState};
use rusqlite::Connection;

use crate::error::HistoryError;

const SCHEMA_VERSION: i64 = 1;

pub struct HistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl HistoryStore {
    /// Opens (creating if absent) the SQLite database at `path`, applying
    /// schema DDL and recording the initial schema version on first open.
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path).map_err(|source| HistoryError::Open {
            path: path.display().to_string(),
            source,
        })?;
        init_schema(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// An in-memory store, used by tests and as a degraded fallback.
    pub fn open_in_memory() -> Result<Self, HistoryError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub async fn record(&self, rec: NewExecutionRecord) -> Result<i64, HistoryError> {
        let conn = Arc::clone(&self.conn);
        run_blocking(move || {
            let conn = conn.lock();
            conn.execute(
                "INSERT INTO execution_history
                 (rule_name, trigger_type, state, started_at, finished_at, duration_ms,
                  retry_attempt, triggered_by_execution_id, event_data, error, output, dry_run)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                rusqlite::params![
                    rec.rule_name,
                    rec.trigger_type,
                    state_label(rec.state),
                    rec.started_at.to_rfc3339(),
                    rec.finished_at.to_rfc3339(),
                    rec.duration_ms,
                    rec.retry_attempt,
                    rec.triggered_by_execution_id,
                    rec.event_data,
                    rec.error,
                    rec.output,
                    rec.dry_run,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
    }

    /// Records ordered newest-first, optionally filtered by rule name and/or
    /// state, capped at `limit`.
    pub async fn history(
        &self,
        rule_name: Option<String>,
        state: Option<ExecutionState>,
        limit: u32,
    ) -> Result<Vec<ExecutionRecord>, HistoryError> {
        let conn = Arc::clone(&self.conn);
        run_blocking(move || {
            let conn = conn.lock();
            const COLUMNS: &str = "id, rule_name, trigger_type, state, started_at, finished_at, duration_ms,
                        retry_attempt, triggered_by_execution_id, event_data, error, output, dry_run";
            let state_label = state.map(state_label);

            let mut stmt;
            let rows = match (&rule_name, &state_label) {
                (Some(name), Some(st)) => {
                    stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM execution_history WHERE rule_name = ?1 AND state = ?2 ORDER BY started_at DESC LIMIT ?3"
                    ))?;
                    stmt.query_map(rusqlite::params![name, st, limit], row_to_record)?
                }
                (Some(name), None) => {
                    stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM execution_history WHERE rule_name = ?1 ORDER BY started_at DESC LIMIT ?2"
                    ))?;
                    stmt.query_map(rusqlite::params![name, limit], row_to_record)?
                }
                (None, Some(st)) => {
                    stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM execution_history WHERE state = ?1 ORDER BY started_at DESC LIMIT ?2"
                    ))?;
                    stmt.query_map(rusqlite::params![st, limit], row_to_record)?
                }
                (None, None) => {
                    stmt = conn.prepare(&format!(
                        "SELECT {COLUMNS} FROM execution_history ORDER BY started_at DESC LIMIT ?1"
                    ))?;
                    stmt.query_map(rusqlite::params![limit], row_to_record)?
                }
            };

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
        .await
    }

    /// The last recorded state for `rule_name`, if any execution exists.
    pub async fn last_state(&self, rule_name: String) -> Result<Option<String>, HistoryError> {
        let conn = Arc::clone(&self.conn);
        run_blocking(move || {
            let conn = conn.lock();
            let result = conn.query_row(
                "SELECT state FROM execution_history WHERE rule_name = ?1 ORDER BY started_at DESC LIMIT 1",
                rusqlite::params![rule_name],
                |row| row.get::<_, String>(0),
            );
            match result {
                Ok(state) => Ok(Some(state)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    /// Deletes records older than `retention_days`, returning the count
    /// removed.
    pub async fn cleanup(&self, retention_days: i64) -> Result<usize, HistoryError> {
        let conn = Arc::clone(&self.conn);
        run_blocking(move || {
            let conn = conn.lock();
            let cutoff = Utc::now() - chrono::Duration::days(retention_days);
            let deleted = conn.execute(
                "DELETE FROM execution_history WHERE started_at < ?1",
                rusqlite::params![cutoff.to_rfc3339()],
            )?;
            Ok(deleted)
        })
        .await
    }
}

pub struct NewExecutionRecord {
    pub rule_name: String,
    pub trigger_type: String,
    pub state: ExecutionState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub retry_attempt: u32,
    pub triggered_by_execution_id: Option<i64>,
    pub event_data: String,
    pub error: Option<String>,
    pub output: String,
    pub dry_run: bool,
}

fn state_label(state: ExecutionState) -> String {
    state.to_string()
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExecutionRecord> {
    let state_str: String = row.get(3)?;
    let started_at: String = row.get(4)?;
    let finished_at: String = row.get(5)?;
    Ok(ExecutionRecord {
        id: row.get(0)?,
        rule_name: row.get(1)?,
        trigger_type: row.get(2)?,
        state: parse_state(&state_str),
        started_at: parse_rfc3339(&started_at),
        finished_at: parse_rfc3339(&finished_at),
        duration_ms: row.get(6)?,
        retry_attempt: row.get(7)?,
        triggered_by_execution_id: row.get(8)?,
        event_data: row.get(9)?,
        error: row.get(10)?,
        output: row.get(11)?,
        dry_run: row.get(12)?,
    })
}

fn parse_state(s: &str) -> ExecutionState {
    match s {
        "success" => ExecutionState::Success,
        "timeout" => ExecutionState::Timeout,
        "cancelled" => ExecutionState::Cancelled,
        _ => ExecutionState::Failure,
    }
}

fn parse_rfc3339(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}

fn init_schema(conn: &Connection) -> Result<(), HistoryError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);
         CREATE TABLE IF NOT EXISTS execution_history (
             id INTEGER PRIMARY KEY AUTOINCREMENT,
             rule_name TEXT NOT NULL,
             trigger_type TEXT NOT NULL,
             state TEXT NOT NULL,
             started_at TEXT NOT NULL,
             finished_at TEXT NOT NULL,
             duration_ms INTEGER NOT NULL,
             retry_attempt INTEGER NOT NULL,
             triggered_by_execution_id INTEGER,
             event_data TEXT NOT NULL,
             error TEXT,
             output TEXT NOT NULL,
             dry_run INTEGER NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_execution_history_rule_name ON execution_history(rule_name);
         CREATE INDEX IF NOT EXISTS idx_execution_history_state ON execution_history(state);
         CREATE INDEX IF NOT EXISTS idx_execution_history_started_at ON execution_history(started_at);",
    )?;

    let has_version: bool = conn.query_row("SELECT EXISTS(SELECT 1 FROM schema_version)", [], |row| row.get(0))?;
    if !has_version {
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", rusqlite::params![SCHEMA_VERSION])?;
    }
    Ok(())
}

async fn run_blocking<F, T>(f: F) -> Result<T, HistoryError>
where
    F: FnOnce() -> Result<T, HistoryError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| HistoryError::WorkerPanic(e.to_string()))?
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
