// ── Hub domain type ──

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::{HubId, NetworkId};
use crate::keys::KeyPair;

/// The single rendezvous entity of a network.
///
/// Its overlay address is always the first usable address of the network
/// block and never passes through the pool's recycle path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    pub id: HubId,
    pub network_id: NetworkId,
    pub name: String,
    /// Address other entities use to reach the hub (IP literal or hostname).
    pub public_address: String,
    pub port: u16,
    pub address: Ipv4Addr,
    pub keys: KeyPair,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
