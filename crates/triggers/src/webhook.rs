//! The webhook trigger: stateless and owns no listener of its own — the
//! HTTP surface looks triggers up by `listen_path` and calls
//! [`WebhookSource::handle_request`] directly.

use std::collections::HashMap;

use rex_core::{Event, WebhookTrigger};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::{try_send, EventSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDecision {
    Accepted,
    Rejected,
}

pub struct WebhookSource {
    rule_name: String,
    config: WebhookTrigger,
}

impl WebhookSource {
    pub fn new(rule_name: String, config: WebhookTrigger) -> Self {
        Self { rule_name, config }
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn listen_path(&self) -> &str {
        &self.config.listen_path
    }

    /// Blocks until cancelled; a webhook owns no background loop.
    pub async fn start(&self, cancel: CancellationToken, _out: EventSender) {
        cancel.cancelled().await;
    }

    pub async fn stop(&self) {}

    /// Validates the inbound request against the method allowlist and, if
    /// configured, the shared-secret header, then enqueues a `webhook`
    /// event on success.
    pub fn handle_request(
        &self,
        method: &str,
        path: &str,
        headers: &HashMap<String, String>,
        body: &str,
        out: &EventSender,
    ) -> WebhookDecision {
        if !self.config.methods.iter().any(|m| m.eq_ignore_ascii_case(method)) {
            return WebhookDecision::Rejected;
        }

        if self.config.require_secret && !self.secret_matches(headers) {
            return WebhookDecision::Rejected;
        }

        let mut data = serde_json::Map::new();
        data.insert("http_body".to_string(), Value::String(body.to_string()));
        data.insert(
            "http_headers".to_string(),
            Value::Object(headers.iter().map(|(k, v)| (k.clone(), Value::String(v.clone()))).collect()),
        );
        data.insert("http_method".to_string(), Value::String(method.to_string()));
        data.insert("http_path".to_string(), Value::String(path.to_string()));

        try_send(out, Event::new(self.rule_name.clone(), "webhook").with_data(data));
        WebhookDecision::Accepted
    }

    fn secret_matches(&self, headers: &HashMap<String, String>) -> bool {
        let Some(header_name) = &self.config.secret_header else { return false };
        let Some(env_var) = &self.config.secret_env_var else { return false };
        let Some(expected) = std::env::var(env_var).ok() else { return false };
        let Some(provided) = headers.get(header_name) else { return false };
        constant_time_eq(provided.as_bytes(), expected.as_bytes())
    }
}

/// Byte-for-byte comparison that takes the same number of operations
/// regardless of where the inputs first differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
