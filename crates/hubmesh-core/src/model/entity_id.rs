// ── Core identity types ──
//
// Every stored record is keyed by a random UUID. Each entity kind gets its
// own newtype so a member id can never be handed to a hub lookup.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Fresh random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
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
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Network`](super::Network).
    NetworkId
);
entity_id!(
    /// Identifier of a [`Hub`](super::Hub).
    HubId
);
entity_id!(
    /// Identifier of a [`Member`](super::Member).
    MemberId
);
entity_id!(
    /// Identifier of a [`ConfigSnapshot`](super::ConfigSnapshot).
    SnapshotId
);
