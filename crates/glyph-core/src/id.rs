use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for glyph entity IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Shared counter so generated IDs never collide across entity kinds.
static COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_with_prefix(prefix: &str) -> Spur {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    INTERNER.get_or_intern(format!("{prefix}_{n}"))
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal, $sigil:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string as an ID, or return the existing one.
            pub fn intern(s: &str) -> Self {
                Self(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &str {
                INTERNER.resolve(&self.0)
            }

            /// Generate a fresh, never-before-seen ID.
            pub fn fresh() -> Self {
                Self(next_with_prefix($prefix))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $sigil, self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::intern(&s))
            }
        }
    };
}

entity_id!(
    /// Identifier of a single point (on- or off-curve) within a glyph.
    PointId,
    "p",
    "#"
);

entity_id!(
    /// Identifier of a contour within a glyph.
    ContourId,
    "c",
    "~"
);

entity_id!(
    /// Identifier of a named anchor.
    AnchorId,
    "a",
    "^"
);
