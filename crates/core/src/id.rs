//! Correlation identifiers threaded through tracing spans and execution
//! records so a single dispatch can be grepped end-to-end.

use std::fmt;

const ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Generates a newtype identifier wrapping a `{prefix}_{12-char nanoid}` string.
///
/// Mirrors the common pattern of a short, greppable, prefixed id rather than
/// a bare UUID: the prefix alone tells a reader what kind of thing they're
/// looking at in a log line.
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new() -> Self {
                Self(format!("{}_{}", $prefix, nanoid::nanoid!(12, &ALPHABET)))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

pub mod event_id {
    use super::*;

    define_id!(EventId, "evt");
    define_id!(HandlerId, "hdl");
}

pub use event_id::{EventId, HandlerId};
