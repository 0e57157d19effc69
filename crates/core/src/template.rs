//! `{{identifier}}` placeholder interpolation against event data.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::sanitize::sanitize;

#[allow(clippy::expect_used)]
static VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").expect("constant regex pattern is valid"));

/// Render `template` by replacing `{{identifier}}` with the sanitized
/// string form of `data[identifier]`. Missing keys are left literal.
pub fn render(template: &str, data: &serde_json::Map<String, Value>) -> String {
    VAR_PATTERN
        .replace_all(template, |caps: &regex::Captures| {
            let name = &caps[1];
            match data.get(name) {
                Some(value) => sanitize(&printed_form(value)),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// The natural printed form of a JSON value: strings pass through as-is,
/// everything else uses its compact JSON rendering.
fn printed_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
