// ── Topology manager ──
//
// Entity lifecycle on top of the store and the per-network address pools.
// Every pool mutation follows the same sequence under the network's pool
// mutex: clone the pool, mutate the clone, commit record + pool snapshot in
// one store transaction, then publish the clone. A failure anywhere before
// the publish leaves both the cached pool and the store untouched.

mod members;
mod reconcile;
pub mod requests;

use std::sync::{Arc, MutexGuard};

use tracing::{debug, info};

use crate::config::TopologyConfig;
use crate::error::{CoreError, Result};
use crate::keys::{KeyGenerator, X25519KeyGenerator};
use crate::model::{Hub, Network, NetworkId};
use crate::pool::{AddressPool, PoolRegistry, SharedPool};
use crate::store::{HubDraft, Store};
use crate::validate::{DefaultValidator, Validator, parse_cidr};

pub use requests::{CreateHubRequest, CreateMemberRequest, UpdateHubRequest, UpdateMemberRequest};

/// Orchestrates networks, hubs and members.
///
/// Owns the pool registry: one live [`AddressPool`] per network touched by
/// this manager, loaded lazily on first use.
pub struct TopologyManager {
    store: Arc<Store>,
    validator: Box<dyn Validator>,
    keys: Box<dyn KeyGenerator>,
    pools: PoolRegistry,
    config: TopologyConfig,
}

impl TopologyManager {
    /// A manager with the production validator and key generator.
    pub fn new(store: Arc<Store>, config: TopologyConfig) -> Self {
        Self {
            store,
            validator: Box::new(DefaultValidator),
            keys: Box::new(X25519KeyGenerator),
            pools: PoolRegistry::new(),
            config,
        }
    }

    #[must_use]
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    #[must_use]
    pub fn with_key_generator(mut self, keys: impl KeyGenerator + 'static) -> Self {
        self.keys = Box::new(keys);
        self
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    // ── Networks ─────────────────────────────────────────────────────

    pub fn create_network(&self, name: &str, cidr: &str) -> Result<Network> {
        self.validator.network_name(name)?;
        self.validator.cidr(cidr)?;
        let pool = AddressPool::from_net(parse_cidr(cidr)?)?;

        let network = self
            .store
            .create_network(name, pool.cidr(), Some(&pool.export()))?;
        self.pools.insert_if_absent(network.id, pool);
        Ok(network)
    }

    pub fn network(&self, name: &str) -> Result<Network> {
        self.store.network_by_name(name)
    }

    pub fn network_by_id(&self, id: &NetworkId) -> Result<Network> {
        self.store.network_by_id(id)
    }

    pub fn list_networks(&self) -> Result<Vec<Network>> {
        self.store.list_networks()
    }

    /// Delete a network and everything it owns.
    pub fn delete_network(&self, name: &str) -> Result<Network> {
        let network = self.store.network_by_name(name)?;

        // Hold the pool lock so no in-flight allocation publishes into an
        // evicted pool.
        let cached = self.pools.get(&network.id);
        let _guard = cached.as_ref().map(lock).transpose()?;
        self.pools.evict(&network.id);

        self.store.delete_network(name)
    }

    /// Copy of the reconciled address pool of a network.
    pub fn pool(&self, network_name: &str) -> Result<AddressPool> {
        let network = self.store.network_by_name(network_name)?;
        let shared = self.reconcile(&network)?;
        let pool = lock(&shared)?;
        Ok(pool.clone())
    }

    // ── Hub ──────────────────────────────────────────────────────────

    /// Create the hub of a network. Its address is the block's first usable
    /// address and never comes from general allocation.
    pub fn create_hub(&self, network_name: &str, request: CreateHubRequest) -> Result<Hub> {
        self.validator.entity_name("hub name", &request.name)?;
        self.validator.public_address(&request.public_address)?;
        let port = self.resolve_port(request.port, self.config.default_listen_port)?;
        let network = self.store.network_by_name(network_name)?;

        let shared = self.reconcile(&network)?;
        let pool = lock(&shared)?;
        let keys = self.keys.generate()?;
        let hub = self.store.create_hub(
            HubDraft {
                network_id: network.id,
                name: request.name,
                public_address: request.public_address,
                port,
                address: pool.hub_address(),
                keys,
            },
            Some(&pool.export()),
        )?;
        debug!(network = %network.name, hub = %hub.name, "hub attached");
        Ok(hub)
    }

    pub fn hub(&self, network_name: &str) -> Result<Hub> {
        let network = self.store.network_by_name(network_name)?;
        self.store.hub_by_network(&network.id)
    }

    pub fn hub_by_name(&self, network_name: &str, hub_name: &str) -> Result<Hub> {
        let network = self.store.network_by_name(network_name)?;
        self.store.hub_by_name(&network.id, hub_name)
    }

    /// Change the hub's reachable address or port. The pool is untouched.
    pub fn update_hub(&self, network_name: &str, request: UpdateHubRequest) -> Result<Hub> {
        let network = self.store.network_by_name(network_name)?;
        let hub = self.store.hub_by_network(&network.id)?;

        let public_address = request.public_address.unwrap_or(hub.public_address);
        self.validator.public_address(&public_address)?;
        let port = self.resolve_port(request.port, hub.port)?;

        let hub = self.store.update_hub(&hub.id, &public_address, port)?;
        info!(hub = %hub.name, endpoint = %public_address, port, "hub updated");
        Ok(hub)
    }

    /// Remove the hub record only. Members keep their records and
    /// addresses.
    pub fn delete_hub(&self, network_name: &str) -> Result<Hub> {
        let network = self.store.network_by_name(network_name)?;
        self.store.delete_hub(&network.id)
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn resolve_port(&self, port: Option<u16>, fallback: u16) -> Result<u16> {
        match port {
            Some(port) => {
                self.validator.port(port)?;
                Ok(port)
            }
            None => Ok(fallback),
        }
    }
}

impl std::fmt::Debug for TopologyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyManager")
            .field("store", &self.store)
            .field("pools", &self.pools.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn lock(pool: &SharedPool) -> Result<MutexGuard<'_, AddressPool>> {
    pool.lock()
        .map_err(|_| CoreError::Internal("address pool lock poisoned".into()))
}
