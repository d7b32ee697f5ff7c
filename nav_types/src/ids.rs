//! Typed identifiers for every entity kind.
//!
//! Each kind gets its own newtype over an opaque string, so a `NodeId` can
//! never be passed where an `EdgeId` is expected. Fresh identities are UUID
//! v4 strings; any string can be wrapped for fixtures and imported data.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates the boilerplate for a string-backed identifier newtype.
///
/// Provides `new()` (fresh UUID), `as_str()`, `Display`, `From<&str>`,
/// `From<String>` and `AsRef<str>`. Ordering is lexicographic on the
/// underlying string, which the router relies on for deterministic
/// tie-breaking.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a fresh identity (UUID v4).
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Borrow the raw identity string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume into the raw identity string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identity of a traversable point in the spatial graph.
    NodeId
);
define_id!(
    /// Identity of a connection between two nodes.
    EdgeId
);
define_id!(
    /// Identity of a polygonal area.
    SpaceId
);
define_id!(
    /// Identity of a floor within a building.
    FloorId
);
define_id!(
    /// Identity of a building.
    BuildingId
);
define_id!(
    /// Identity of a routing profile.
    ProfileId
);
