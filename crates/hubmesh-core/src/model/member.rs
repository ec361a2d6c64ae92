// ── Member domain types ──

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::entity_id::{MemberId, NetworkId};
use crate::keys::KeyPair;

/// Connectivity policy of a member.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MemberKind {
    /// Full mesh: reachable by, and reaching, the hub and every other peer.
    #[default]
    Peer,
    /// Spoke: reaches the hub and every peer, never another route member.
    Route,
}

impl MemberKind {
    pub fn is_peer(self) -> bool {
        matches!(self, Self::Peer)
    }

    /// Whether a member of this kind must publish a reachable address.
    pub fn requires_public_address(self) -> bool {
        self.is_peer()
    }
}

/// A peer- or route-type entity attached to a network.
///
/// `public_address` is empty only for route members that are never dialed
/// directly; the hub learns their origin on first contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub network_id: NetworkId,
    /// Unique within the owning network only.
    pub name: String,
    #[serde(default)]
    pub public_address: String,
    pub port: u16,
    pub address: Ipv4Addr,
    pub kind: MemberKind,
    pub keys: KeyPair,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    pub fn has_public_address(&self) -> bool {
        !self.public_address.is_empty()
    }
}
