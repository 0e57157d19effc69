//! Value sanitization (applied to every interpolated template value) and
//! output scrubbing (applied once before an execution's output is
//! persisted).

use std::sync::LazyLock;

use regex::Regex;

const MAX_SANITIZED_LEN: usize = 1024;

/// Strip control bytes (except tab/newline), remove triple-backtick
/// sequences, and truncate to 1024 characters.
///
/// Idempotent: `sanitize(sanitize(s)) == sanitize(s)`, since the output
/// already satisfies every condition it enforces.
pub fn sanitize(value: &str) -> String {
    let stripped: String = value
        .chars()
        .filter(|&c| {
            let code = c as u32;
            !(code < 0x20) || c == '\t' || c == '\n'
        })
        .collect();

    let without_fences = stripped.replace("```", "");

    without_fences.chars().take(MAX_SANITIZED_LEN).collect()
}

#[allow(clippy::expect_used)]
static PLEX_TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"X-Plex-Token=\S+").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static BEARER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer \S{20,}").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static HEX_RUN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9a-fA-F]{32,}\b").expect("constant regex pattern is valid"));

/// Redact `X-Plex-Token=...`, `Bearer ...` (≥20 non-space chars), and
/// isolated hex runs of ≥32 characters, preserving the literal prefix on
/// the first two patterns.
pub fn scrub_output(s: &str) -> String {
    let s = PLEX_TOKEN_PATTERN.replace_all(s, "X-Plex-Token=[REDACTED]");
    let s = BEARER_PATTERN.replace_all(&s, "Bearer [REDACTED]");
    let s = HEX_RUN_PATTERN.replace_all(&s, "[REDACTED]");
    s.into_owned()
}

#[cfg(test)]
#[path = "sanitize_tests.rs"]
mod tests;
