//! A minimal HTTP client for the daemon's admin surface: resolves the
//! listen address from `config.yaml` under a data directory (falling back
//! to the daemon's own defaults when no config is on disk) and wraps the
//! handful of requests the CLI subcommands need.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use rex_core::GlobalConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
}

impl DaemonClient {
    pub fn for_data_dir(data_dir: &Path) -> Result<Self> {
        let layout = rex_daemon::DataLayout::new(data_dir);
        let global = if layout.config_path().exists() {
            rex_rules::load_global_config(&layout.config_path())
                .with_context(|| format!("reading {}", layout.config_path().display()))?
        } else {
            GlobalConfig::default()
        };

        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().context("building http client")?;
        Ok(Self { base_url: format!("http://{}:{}", global.daemon.host, global.daemon.port), http })
    }

    pub async fn health(&self) -> Result<serde_json::Value> {
        self.get_json("/health").await
    }

    pub async fn rules(&self) -> Result<serde_json::Value> {
        self.get_json("/api/rules").await
    }

    pub async fn history(&self, rule: Option<&str>, state: Option<&str>, limit: Option<u32>) -> Result<serde_json::Value> {
        let mut query = Vec::new();
        if let Some(rule) = rule {
            query.push(("rule", rule.to_string()));
        }
        if let Some(state) = state {
            query.push(("state", state.to_string()));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let response = self
            .http
            .get(format!("{}/api/history", self.base_url))
            .query(&query)
            .send()
            .await
            .with_context(|| "is the daemon running?".to_string())?;
        Self::parse_json(response).await
    }

    pub async fn fire(&self, rule_name: &str, data: serde_json::Map<String, serde_json::Value>) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/api/fire/{rule_name}", self.base_url))
            .json(&serde_json::Value::Object(data))
            .send()
            .await
            .with_context(|| "is the daemon running?".to_string())?;

        if !response.status().is_success() {
            bail!("daemon rejected fire request: {} {}", response.status(), response.text().await.unwrap_or_default());
        }
        Ok(())
    }

    pub async fn reload(&self) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/api/reload", self.base_url))
            .send()
            .await
            .with_context(|| "is the daemon running?".to_string())?;

        if !response.status().is_success() {
            bail!("daemon rejected reload request: {}", response.status());
        }
        Ok(())
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value> {
        let response =
            self.http.get(format!("{}{path}", self.base_url)).send().await.with_context(|| "is the daemon running?".to_string())?;
        Self::parse_json(response).await
    }

    async fn parse_json(response: reqwest::Response) -> Result<serde_json::Value> {
        let status = response.status();
        if !status.is_success() {
            bail!("daemon returned {status}");
        }
        response.json().await.context("parsing daemon response")
    }
}
