//! Typed identifiers for the campus aggregates.
//!
//! Every id wraps a random v4 UUID and renders as its hyphenated form. Ids
//! order by their UUID, which gives listings a stable tie-break.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A string that does not parse as an id of the expected kind.
#[derive(Debug, thiserror::Error)]
#[error("invalid {kind} id `{value}`")]
pub struct InvalidId {
    pub kind: &'static str,
    pub value: String,
    #[source]
    source: uuid::Error,
}

macro_rules! campus_ids {
    ($($(#[doc = $doc:expr])* $name:ident => $kind:literal;)+) => {$(
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Name used in error messages and logs.
            pub const KIND: &'static str = $kind;

            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.hyphenated().fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = InvalidId;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s.trim()).map(Self).map_err(|source| InvalidId {
                    kind: $kind,
                    value: s.to_string(),
                    source,
                })
            }
        }
    )+};
}

campus_ids! {
    /// Identifies a [`Building`](crate::building::Building).
    BuildingId => "building";
    /// Identifies a [`Floor`](crate::floor::Floor).
    FloorId => "floor";
    /// Identifies a [`Space`](crate::space::Space).
    SpaceId => "space";
    /// Identifies an [`Equipment`](crate::equipment::Equipment).
    EquipmentId => "equipment";
    /// Person occupying a room. Owned by an external directory.
    OccupantId => "occupant";
    /// Identifies a published [`DomainEvent`](crate::event::DomainEvent).
    EventId => "event";
}
