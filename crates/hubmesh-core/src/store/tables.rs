//! redb table definitions for the hubmesh store.
//!
//! Record tables use `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Index tables map a lookup key to a record id. Keys of
//! network-owned rows start with the owning network id so every per-network
//! query is a prefix range scan:
//!
//! - name indexes: `{network_id}:{name}`
//! - config snapshots: `{network_id}/{version:010}`

use redb::TableDefinition;

use crate::model::NetworkId;

pub(crate) type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;
pub(crate) type IndexTable = TableDefinition<'static, &'static str, &'static str>;

/// Networks keyed by `{network_id}`.
pub(crate) const NETWORKS: RecordTable = TableDefinition::new("networks");

/// Network name -> `{network_id}`.
pub(crate) const NETWORKS_BY_NAME: IndexTable = TableDefinition::new("networks_by_name");

/// Hubs keyed by `{hub_id}`.
pub(crate) const HUBS: RecordTable = TableDefinition::new("hubs");

/// `{network_id}` -> `{hub_id}`. At most one row per network.
pub(crate) const HUBS_BY_NETWORK: IndexTable = TableDefinition::new("hubs_by_network");

/// `{network_id}:{name}` -> `{hub_id}`.
pub(crate) const HUBS_BY_NAME: IndexTable = TableDefinition::new("hubs_by_name");

/// Members keyed by `{member_id}`.
pub(crate) const MEMBERS: RecordTable = TableDefinition::new("members");

/// `{network_id}:{name}` -> `{member_id}`.
pub(crate) const MEMBERS_BY_NAME: IndexTable = TableDefinition::new("members_by_name");

/// Config snapshots keyed by `{network_id}/{version:010}`.
pub(crate) const CONFIG_SNAPSHOTS: RecordTable = TableDefinition::new("config_snapshots");

/// Address pool snapshots keyed by `{network_id}`.
pub(crate) const ADDRESS_POOLS: RecordTable = TableDefinition::new("address_pools");

pub(crate) const RECORD_TABLES: [RecordTable; 5] =
    [NETWORKS, HUBS, MEMBERS, CONFIG_SNAPSHOTS, ADDRESS_POOLS];

pub(crate) const INDEX_TABLES: [IndexTable; 4] =
    [NETWORKS_BY_NAME, HUBS_BY_NETWORK, HUBS_BY_NAME, MEMBERS_BY_NAME];

// ── Key builders ─────────────────────────────────────────────────────

pub(crate) fn scoped_name_key(network: &NetworkId, name: &str) -> String {
    format!("{network}:{name}")
}

/// Half-open key range covering every `{network_id}:*` row.
pub(crate) fn scoped_name_range(network: &NetworkId) -> (String, String) {
    // ';' is the byte after ':'.
    (format!("{network}:"), format!("{network};"))
}

pub(crate) fn snapshot_key(network: &NetworkId, version: u32) -> String {
    format!("{network}/{version:010}")
}

/// Half-open key range covering every `{network_id}/*` row.
pub(crate) fn snapshot_range(network: &NetworkId) -> (String, String) {
    // '0' is the byte after '/'.
    (format!("{network}/"), format!("{network}0"))
}
