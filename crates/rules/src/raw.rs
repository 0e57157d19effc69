//! Deserialization target for a rule document exactly as it appears on
//! disk. Every field is optional here so validation can produce a
//! descriptive, field-naming error rather than a generic serde failure.

use rex_core::{AgentConfig, OnFailure};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RawRule {
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub run_as_user: Option<String>,
    #[serde(default)]
    pub trigger: Option<serde_yaml::Value>,
    #[serde(default)]
    pub action: Option<RawAction>,
    #[serde(default)]
    pub agent_config: Option<AgentConfig>,
    #[serde(default)]
    pub dry_run: Option<bool>,
    #[serde(default)]
    pub depends_on_rules: Option<Vec<String>>,
    #[serde(default)]
    pub triggers_rules: Option<Vec<String>>,
    #[serde(default)]
    pub on_failure: Option<OnFailure>,
    #[serde(default)]
    pub max_timeout_seconds: Option<i64>,
    #[serde(default)]
    pub max_actions: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RawAction {
    pub prompt: Option<String>,
}
