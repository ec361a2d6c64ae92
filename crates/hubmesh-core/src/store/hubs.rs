// ── Hub records ──

use std::net::Ipv4Addr;

use chrono::Utc;
use redb::ReadableTable;
use tracing::info;

use super::networks::dangling;
use super::pools::write_pool;
use super::tables::{self, scoped_name_key};
use super::{Store, get_index, get_record, put_record};
use crate::error::{CoreError, Result};
use crate::keys::KeyPair;
use crate::model::{Hub, HubId, Network, NetworkId};
use crate::pool::PoolSnapshot;

/// Everything needed to persist a hub. The store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct HubDraft {
    pub network_id: NetworkId,
    pub name: String,
    pub public_address: String,
    pub port: u16,
    pub address: Ipv4Addr,
    pub keys: KeyPair,
}

impl Store {
    /// Persist a hub together with the pool snapshot that reserves its
    /// address.
    ///
    /// Fails with `NotFound` if the network is gone, `AlreadyExists` if it
    /// already has a hub, and `DuplicateName` if a hub or member of the
    /// network already uses the name.
    pub fn create_hub(&self, draft: HubDraft, pool: Option<&PoolSnapshot>) -> Result<Hub> {
        let hub = self.write(|txn| {
            let network_key = draft.network_id.to_string();
            let network: Network = get_record(&txn.open_table(tables::NETWORKS)?, &network_key)?
                .ok_or_else(|| CoreError::not_found("network", draft.network_id))?;

            let mut by_network = txn.open_table(tables::HUBS_BY_NETWORK)?;
            if by_network.get(network_key.as_str())?.is_some() {
                return Err(CoreError::AlreadyExists {
                    entity: "hub".into(),
                    identifier: format!("network '{}'", network.name),
                });
            }

            let name_key = scoped_name_key(&draft.network_id, &draft.name);
            let mut by_name = txn.open_table(tables::HUBS_BY_NAME)?;
            if get_index(&txn.open_table(tables::MEMBERS_BY_NAME)?, &name_key)?.is_some() {
                return Err(CoreError::duplicate("hub", &draft.name));
            }

            let now = Utc::now();
            let hub = Hub {
                id: HubId::new(),
                network_id: draft.network_id,
                name: draft.name.clone(),
                public_address: draft.public_address.clone(),
                port: draft.port,
                address: draft.address,
                keys: draft.keys.clone(),
                created_at: now,
                updated_at: now,
            };
            let id = hub.id.to_string();
            put_record(&mut txn.open_table(tables::HUBS)?, &id, &hub)?;
            by_network.insert(network_key.as_str(), id.as_str())?;
            by_name.insert(name_key.as_str(), id.as_str())?;
            if let Some(snapshot) = pool {
                write_pool(txn, &draft.network_id, snapshot)?;
            }
            Ok(hub)
        })?;

        info!(hub = %hub.name, address = %hub.address, "hub created");
        Ok(hub)
    }

    pub fn hub_by_network(&self, network: &NetworkId) -> Result<Hub> {
        self.read(|txn| {
            let id = get_index(&txn.open_table(tables::HUBS_BY_NETWORK)?, &network.to_string())?
                .ok_or_else(|| CoreError::not_found("hub", format!("network {network}")))?;
            get_record(&txn.open_table(tables::HUBS)?, &id)?.ok_or_else(|| dangling("hub", &id))
        })
    }

    pub fn hub_by_name(&self, network: &NetworkId, name: &str) -> Result<Hub> {
        self.read(|txn| {
            let key = scoped_name_key(network, name);
            let id = get_index(&txn.open_table(tables::HUBS_BY_NAME)?, &key)?
                .ok_or_else(|| CoreError::not_found("hub", name))?;
            get_record(&txn.open_table(tables::HUBS)?, &id)?.ok_or_else(|| dangling("hub", name))
        })
    }

    /// Change the reachable address and port of a hub. Name, overlay
    /// address and keys are fixed for the hub's lifetime.
    pub fn update_hub(&self, id: &HubId, public_address: &str, port: u16) -> Result<Hub> {
        self.write(|txn| {
            let key = id.to_string();
            let mut records = txn.open_table(tables::HUBS)?;
            let mut hub: Hub =
                get_record(&records, &key)?.ok_or_else(|| CoreError::not_found("hub", id))?;
            public_address.clone_into(&mut hub.public_address);
            hub.port = port;
            hub.updated_at = Utc::now();
            put_record(&mut records, &key, &hub)?;
            Ok(hub)
        })
    }

    /// Remove the hub of `network` and its index rows. Members are left in
    /// place.
    pub fn delete_hub(&self, network: &NetworkId) -> Result<Hub> {
        let hub = self.write(|txn| {
            let network_key = network.to_string();
            let mut by_network = txn.open_table(tables::HUBS_BY_NETWORK)?;
            let id = get_index(&by_network, &network_key)?
                .ok_or_else(|| CoreError::not_found("hub", format!("network {network}")))?;

            let mut records = txn.open_table(tables::HUBS)?;
            let hub: Hub = get_record(&records, &id)?.ok_or_else(|| dangling("hub", &id))?;
            records.remove(id.as_str())?;
            by_network.remove(network_key.as_str())?;
            txn.open_table(tables::HUBS_BY_NAME)?
                .remove(scoped_name_key(network, &hub.name).as_str())?;
            Ok(hub)
        })?;

        info!(hub = %hub.name, "hub deleted");
        Ok(hub)
    }
}
