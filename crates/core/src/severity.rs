//! Shared error taxonomy: every crate-boundary error type reports which of
//! these five buckets it falls into so the daemon's startup and reload
//! paths can decide fatal-vs-log-and-continue uniformly.

use crate::macros::simple_display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Rule/config parse or validation, permission checks.
    Configuration,
    /// Subprocess failure or timeout; recorded as a history state.
    Operational,
    /// Webhook rejected or rate-limited; responded to over HTTP, never enqueued.
    Transport,
    /// Channel full, store unavailable; logged and degraded, never fatal.
    Internal,
    /// Cannot open logs, cannot bind the HTTP listener; daemon exits non-zero.
    Fatal,
}

simple_display!(Severity {
    Configuration => "configuration",
    Operational => "operational",
    Transport => "transport",
    Internal => "internal",
    Fatal => "fatal",
});

/// Implemented by every crate-local error enum so a caller can decide how to
/// react without re-deriving the taxonomy bucket ad hoc at each call site.
pub trait Severe {
    fn severity(&self) -> Severity;
}
