// ── Network records and cascade delete ──

use chrono::Utc;
use ipnet::Ipv4Net;
use redb::{ReadableTable, WriteTransaction};
use tracing::info;

use super::tables::{self, scoped_name_range, snapshot_range};
use super::{Store, get_index, get_record, put_record, scan_index};
use crate::error::{CoreError, Result};
use crate::model::{Network, NetworkId};
use crate::pool::PoolSnapshot;

impl Store {
    /// Persist a new network, optionally with its initial pool snapshot.
    pub fn create_network(
        &self,
        name: &str,
        cidr: Ipv4Net,
        pool: Option<&PoolSnapshot>,
    ) -> Result<Network> {
        let network = self.write(|txn| {
            let mut by_name = txn.open_table(tables::NETWORKS_BY_NAME)?;
            if by_name.get(name)?.is_some() {
                return Err(CoreError::duplicate("network", name));
            }

            let network = Network {
                id: NetworkId::new(),
                name: name.to_owned(),
                cidr,
                created_at: Utc::now(),
            };
            let id = network.id.to_string();
            put_record(&mut txn.open_table(tables::NETWORKS)?, &id, &network)?;
            by_name.insert(name, id.as_str())?;
            if let Some(snapshot) = pool {
                put_record(&mut txn.open_table(tables::ADDRESS_POOLS)?, &id, snapshot)?;
            }
            Ok(network)
        })?;

        info!(network = %network.name, cidr = %network.cidr, "network created");
        Ok(network)
    }

    pub fn network_by_name(&self, name: &str) -> Result<Network> {
        self.read(|txn| {
            let id = get_index(&txn.open_table(tables::NETWORKS_BY_NAME)?, name)?
                .ok_or_else(|| CoreError::not_found("network", name))?;
            get_record(&txn.open_table(tables::NETWORKS)?, &id)?
                .ok_or_else(|| dangling("network", name))
        })
    }

    pub fn network_by_id(&self, id: &NetworkId) -> Result<Network> {
        self.read(|txn| {
            get_record(&txn.open_table(tables::NETWORKS)?, &id.to_string())?
                .ok_or_else(|| CoreError::not_found("network", id))
        })
    }

    /// Every network, ordered by name.
    pub fn list_networks(&self) -> Result<Vec<Network>> {
        self.read(|txn| {
            let by_name = txn.open_table(tables::NETWORKS_BY_NAME)?;
            let records = txn.open_table(tables::NETWORKS)?;
            let mut networks = Vec::new();
            for entry in by_name.iter()? {
                let (name, id) = entry?;
                let network = get_record(&records, id.value())?
                    .ok_or_else(|| dangling("network", name.value()))?;
                networks.push(network);
            }
            Ok(networks)
        })
    }

    /// Remove a network and everything it owns in one transaction: hub,
    /// members, config snapshots, their index rows, and the pool snapshot.
    pub fn delete_network(&self, name: &str) -> Result<Network> {
        let (network, removed) = self.write(|txn| {
            let mut by_name = txn.open_table(tables::NETWORKS_BY_NAME)?;
            let id = get_index(&by_name, name)?
                .ok_or_else(|| CoreError::not_found("network", name))?;
            let mut records = txn.open_table(tables::NETWORKS)?;
            let network: Network =
                get_record(&records, &id)?.ok_or_else(|| dangling("network", name))?;

            let removed = remove_owned_rows(txn, &network.id)?;

            txn.open_table(tables::ADDRESS_POOLS)?.remove(id.as_str())?;
            records.remove(id.as_str())?;
            by_name.remove(name)?;
            Ok((network, removed))
        })?;

        info!(
            network = %network.name,
            members = removed.members,
            snapshots = removed.snapshots,
            "network deleted"
        );
        Ok(network)
    }
}

#[derive(Debug, Default)]
struct RemovedRows {
    members: usize,
    snapshots: usize,
}

fn remove_owned_rows(txn: &WriteTransaction, network: &NetworkId) -> Result<RemovedRows> {
    let network_key = network.to_string();
    let (lo, hi) = scoped_name_range(network);

    // Hub: at most one, reachable through the per-network index.
    let mut hubs_by_network = txn.open_table(tables::HUBS_BY_NETWORK)?;
    if let Some(hub_id) = get_index(&hubs_by_network, &network_key)? {
        txn.open_table(tables::HUBS)?.remove(hub_id.as_str())?;
        hubs_by_network.remove(network_key.as_str())?;
    }
    let mut hubs_by_name = txn.open_table(tables::HUBS_BY_NAME)?;
    for (key, _) in scan_index(&hubs_by_name, &lo, &hi)? {
        hubs_by_name.remove(key.as_str())?;
    }

    let mut members_by_name = txn.open_table(tables::MEMBERS_BY_NAME)?;
    let mut members = txn.open_table(tables::MEMBERS)?;
    let member_rows = scan_index(&members_by_name, &lo, &hi)?;
    for (key, member_id) in &member_rows {
        members.remove(member_id.as_str())?;
        members_by_name.remove(key.as_str())?;
    }

    let mut snapshots = txn.open_table(tables::CONFIG_SNAPSHOTS)?;
    let (lo, hi) = snapshot_range(network);
    let mut snapshot_keys = Vec::new();
    for entry in snapshots.range(lo.as_str()..hi.as_str())? {
        let (key, _) = entry?;
        snapshot_keys.push(key.value().to_owned());
    }
    for key in &snapshot_keys {
        snapshots.remove(key.as_str())?;
    }

    Ok(RemovedRows {
        members: member_rows.len(),
        snapshots: snapshot_keys.len(),
    })
}

/// An index row whose record is missing.
pub(super) fn dangling(entity: &str, identifier: &str) -> CoreError {
    CoreError::Internal(format!(
        "{entity} index entry '{identifier}' points at a missing record"
    ))
}
