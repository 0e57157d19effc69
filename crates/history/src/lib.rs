//! Execution history persisted in an embedded SQLite database, with
//! indexes on `rule_name`, `state`, and `started_at` for the HTTP and CLI
//! query surfaces.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod store;

pub use error::HistoryError;
pub use store::{HistoryStore, NewExecutionRecord};
