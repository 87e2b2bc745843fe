//! Type-safe identifier wrappers.
//!
//! Node and edge identifiers are assigned once by the map generator and stay
//! stable for the whole game: nodes and edges are never deleted or
//! re-indexed. Player identifiers are assigned at game start. All ids are
//! small integers so that ordering by id gives deterministic iteration and
//! tie-breaks.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around [`u32`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
        )]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u32);

        impl $name {
            /// Wrap a raw identifier.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Return the inner value.
            pub const fn into_inner(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a node in the transport graph.
    NodeId, "n"
}

define_id! {
    /// Unique identifier for an undirected edge in the transport graph.
    EdgeId, "e"
}

define_id! {
    /// Unique identifier for a player (economic agent).
    PlayerId, "p"
}
