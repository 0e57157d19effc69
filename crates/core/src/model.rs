//! The validated, in-memory shapes the rest of the daemon operates on.
//!
//! These are the *output* of the rule loader (`rex-rules`), not the raw
//! on-disk document shape — the loader owns translating lenient YAML into
//! these fully-defaulted, pre-validated structs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::macros::simple_display;

pub const DEFAULT_MAX_TIMEOUT_SECONDS: u32 = 300;
pub const DEFAULT_MAX_ACTIONS: u32 = 50;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECONDS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// A declarative automation unit binding a trigger to a prompt template and
/// an agent invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub run_as_user: Option<String>,
    pub trigger: Trigger,
    pub action_prompt: String,
    #[serde(default)]
    pub agent_config: AgentConfig,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub depends_on_rules: Vec<String>,
    #[serde(default)]
    pub triggers_rules: Vec<String>,
    #[serde(default)]
    pub on_failure: OnFailure,
    #[serde(default = "default_max_timeout_seconds")]
    pub max_timeout_seconds: u32,
    #[serde(default = "default_max_actions")]
    pub max_actions: u32,
}

fn default_max_timeout_seconds() -> u32 {
    DEFAULT_MAX_TIMEOUT_SECONDS
}

fn default_max_actions() -> u32 {
    DEFAULT_MAX_ACTIONS
}

impl Rule {
    /// True when this rule's trigger-affecting fields differ from another
    /// rule of the same name, per the hot-reload field comparison in the
    /// component design (type, schedule expressions, watch paths, events).
    pub fn trigger_affecting_fields_differ(&self, other: &Rule) -> bool {
        match (&self.trigger, &other.trigger) {
            (Trigger::Filesystem(a), Trigger::Filesystem(b)) => a.watch_paths != b.watch_paths,
            (Trigger::Scheduled(a), Trigger::Scheduled(b)) => {
                a.cron_expression != b.cron_expression
                    || a.run_every != b.run_every
                    || a.run_at != b.run_at
            }
            (Trigger::Webhook(a), Trigger::Webhook(b)) => a.listen_path != b.listen_path,
            (Trigger::Lifecycle(a), Trigger::Lifecycle(b)) => a.on_events != b.on_events,
            (Trigger::Manual, Trigger::Manual) => false,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    Filesystem(FilesystemTrigger),
    Scheduled(ScheduledTrigger),
    Webhook(WebhookTrigger),
    Lifecycle(LifecycleTrigger),
    Manual,
}

impl Trigger {
    pub fn kind(&self) -> &'static str {
        match self {
            Trigger::Filesystem(_) => "filesystem",
            Trigger::Scheduled(_) => "scheduled",
            Trigger::Webhook(_) => "webhook",
            Trigger::Lifecycle(_) => "lifecycle",
            Trigger::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilesystemTrigger {
    pub watch_paths: Vec<String>,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default)]
    pub debounce_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScheduledTrigger {
    #[serde(default)]
    pub cron_expression: Option<String>,
    #[serde(default)]
    pub run_every: Option<String>,
    #[serde(default)]
    pub run_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WebhookTrigger {
    pub listen_path: String,
    #[serde(default = "default_webhook_methods")]
    pub methods: Vec<String>,
    #[serde(default)]
    pub require_secret: bool,
    #[serde(default)]
    pub secret_header: Option<String>,
    #[serde(default)]
    pub secret_env_var: Option<String>,
}

fn default_webhook_methods() -> Vec<String> {
    vec!["POST".to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LifecycleTrigger {
    pub on_events: Vec<String>,
}

/// The nine merge fields plus the memory tri-state.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AgentConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    #[serde(default)]
    pub disallowed_tools: Vec<String>,
    #[serde(default)]
    pub add_dirs: Vec<String>,
    #[serde(default)]
    pub permission_mode: Option<String>,
    #[serde(default)]
    pub max_budget_usd: Option<f64>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub append_system_prompt: Option<String>,
    #[serde(default)]
    pub mcp_config: Vec<String>,
    #[serde(default)]
    pub env_vars: HashMap<String, String>,
    /// `None` inherits the global setting; `Some(_)` overrides it.
    #[serde(default)]
    pub memory: Option<bool>,
}

impl AgentConfig {
    /// Per-field fallback of empty rule values to the default, per the
    /// merge policy: zero/empty rule values are replaced by the default,
    /// otherwise the rule value wins outright. `env_vars` merges key-wise
    /// with rule values taking precedence on conflict.
    pub fn merge(&self, defaults: &AgentConfig) -> AgentConfig {
        let mut env_vars = defaults.env_vars.clone();
        env_vars.extend(self.env_vars.clone());

        AgentConfig {
            model: self.model.clone().or_else(|| defaults.model.clone()),
            allowed_tools: pick_list(&self.allowed_tools, &defaults.allowed_tools),
            disallowed_tools: pick_list(&self.disallowed_tools, &defaults.disallowed_tools),
            add_dirs: pick_list(&self.add_dirs, &defaults.add_dirs),
            permission_mode: self.permission_mode.clone().or_else(|| defaults.permission_mode.clone()),
            max_budget_usd: match self.max_budget_usd {
                Some(v) if v != 0.0 => Some(v),
                _ => defaults.max_budget_usd,
            },
            system_prompt: self.system_prompt.clone().or_else(|| defaults.system_prompt.clone()),
            append_system_prompt: self
                .append_system_prompt
                .clone()
                .or_else(|| defaults.append_system_prompt.clone()),
            mcp_config: pick_list(&self.mcp_config, &defaults.mcp_config),
            env_vars,
            memory: self.memory.or(defaults.memory),
        }
    }
}

fn pick_list(rule: &[String], default: &[String]) -> Vec<String> {
    if rule.is_empty() {
        default.to_vec()
    } else {
        rule.to_vec()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OnFailure {
    #[serde(default)]
    pub retry: bool,
    #[serde(default)]
    pub retry_attempts: u32,
    #[serde(default)]
    pub retry_delay_seconds: u64,
}

impl OnFailure {
    pub fn attempts(&self) -> u32 {
        if self.retry && self.retry_attempts == 0 {
            DEFAULT_RETRY_ATTEMPTS
        } else {
            self.retry_attempts
        }
    }

    pub fn delay_seconds(&self) -> u64 {
        if self.retry_delay_seconds == 0 {
            DEFAULT_RETRY_DELAY_SECONDS
        } else {
            self.retry_delay_seconds
        }
    }
}

/// Global daemon configuration (`config.yaml`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GlobalConfig {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub agent_defaults: AgentConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rule_execution: RuleExecutionConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub allowed_run_as_users: Vec<String>,
    /// Path (or bare name, resolved via `PATH`) to the external agent
    /// binary invoked for every rule.
    #[serde(default = "default_agent_path")]
    pub agent_path: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8642
}

fn default_agent_path() -> String {
    "claude".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            host: default_host(),
            port: default_port(),
            allowed_run_as_users: Vec::new(),
            agent_path: default_agent_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleExecutionConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

impl Default for RuleExecutionConfig {
    fn default() -> Self {
        Self { max_concurrent: default_max_concurrent() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MemoryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub path: Option<String>,
}

/// A record produced by a trigger and consumed by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub rule_name: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl Event {
    pub fn new(rule_name: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            rule_name: rule_name.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            data: serde_json::Map::new(),
        }
    }

    pub fn with_data(mut self, data: serde_json::Map<String, serde_json::Value>) -> Self {
        self.data = data;
        self
    }

    /// Invariant I6: insert `event_type`/`timestamp` into `data` only if
    /// absent, never overwriting a caller-provided value.
    pub fn enrich(&mut self) {
        self.data.entry("event_type").or_insert_with(|| serde_json::Value::String(self.event_type.clone()));
        self.data
            .entry("timestamp")
            .or_insert_with(|| serde_json::Value::String(self.timestamp.to_rfc3339()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Success,
    Failure,
    Timeout,
    Cancelled,
}

simple_display!(ExecutionState {
    Success => "success",
    Failure => "failure",
    Timeout => "timeout",
    Cancelled => "cancelled",
});

impl ExecutionState {
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, ExecutionState::Failure | ExecutionState::Timeout)
    }
}

/// A persisted record of one rule execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub id: i64,
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

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
