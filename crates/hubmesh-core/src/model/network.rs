// ── Network domain type ──

use chrono::{DateTime, Utc};
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use super::entity_id::NetworkId;

/// An isolated overlay address space.
///
/// `name` is globally unique. `cidr` is stored in canonical form (host bits
/// cleared), so `10.0.0.7/24` is persisted as `10.0.0.0/24`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: NetworkId,
    pub name: String,
    pub cidr: Ipv4Net,
    pub created_at: DateTime<Utc>,
}
