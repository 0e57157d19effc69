//! Small declarative macros shared across the crate.

/// Generates a `Display` impl that writes the given literal strings for each
/// unit-like match arm. Keeps the wire representation of an enum next to its
/// definition instead of scattered across call sites.
macro_rules! simple_display {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let s = match self {
                    $(<$ty>::$variant => $text,)+
                };
                f.write_str(s)
            }
        }
    };
}

pub(crate) use simple_display;
