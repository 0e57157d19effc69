//! Shared fixtures for dispatcher unit tests: a minimal manual-trigger rule
//! and a `Dispatcher` wired with an in-memory history store and an
//! unreachable agent binary (tests assert on dispatch/retry/chain behavior
//! around execution, not on the subprocess outcome itself, unless they
//! override `exec.agent_path`).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rex_core::{AgentConfig, OnFailure, Rule, Trigger};
use rex_history::HistoryStore;

use super::{Dispatcher, ExecContext};

pub fn manual_rule(name: &str) -> Rule {
    Rule {
        name: name.to_string(),
        description: None,
        enabled: true,
        run_as_user: None,
        trigger: Trigger::Manual,
        action_prompt: "do the thing".to_string(),
        agent_config: AgentConfig::default(),
        dry_run: false,
        depends_on_rules: Vec::new(),
        triggers_rules: Vec::new(),
        on_failure: OnFailure::default(),
        max_timeout_seconds: 5,
        max_actions: 50,
    }
}

pub fn test_dispatcher(rules: Vec<Rule>) -> Arc<Dispatcher> {
    test_dispatcher_with_agent(rules, "/bin/true")
}

pub fn test_dispatcher_with_agent(rules: Vec<Rule>, agent_path: &str) -> Arc<Dispatcher> {
    let history = HistoryStore::open_in_memory().expect("in-memory history store");
    let (tx, _rx) = tokio::sync::mpsc::channel(100);
    Dispatcher::new(
        Arc::new(RwLock::new(rules)),
        Arc::new(RwLock::new(HashMap::new())),
        Arc::new(Mutex::new(HashMap::new())),
        tx,
        Some(Arc::new(history)),
        4,
        ExecContext {
            agent_path: agent_path.to_string(),
            debug: false,
            agent_defaults: AgentConfig::default(),
            memory_enabled: false,
            memory_path: None,
            daemon_exe: None,
            home_dir: None,
        },
    )
}
