//! Chain evaluation: parses conditional-trigger markers out of scrubbed
//! subprocess output and resolves which downstream rules to enqueue.

use std::collections::HashSet;

/// Extracts every `TRIGGER:<name>` marker from `output`, one per line,
/// trimming surrounding whitespace on both the line and the name.
pub fn extract_markers(output: &str) -> HashSet<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("TRIGGER:"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Resolves the downstream rule names to enqueue: `T ∩ M` when markers are
/// present, else all of `T`.
pub fn resolve_targets<'a>(triggers_rules: &'a [String], markers: &HashSet<String>) -> Vec<&'a str> {
    if markers.is_empty() {
        return triggers_rules.iter().map(String::as_str).collect();
    }
    triggers_rules.iter().filter(|name| markers.contains(name.as_str())).map(String::as_str).collect()
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
