// ── In-memory pool registry ──
//
// One live `AddressPool` per active network, owned by a single topology
// manager. Each pool sits behind its own mutex so an allocate / persist /
// publish sequence for one network never interleaves with another caller's.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::AddressPool;
use crate::model::NetworkId;

pub type SharedPool = Arc<Mutex<AddressPool>>;

#[derive(Debug, Default)]
pub struct PoolRegistry {
    pools: DashMap<NetworkId, SharedPool>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached pool for `network`, if one has been loaded.
    pub fn get(&self, network: &NetworkId) -> Option<SharedPool> {
        self.pools.get(network).map(|r| Arc::clone(r.value()))
    }

    /// Cache `pool` unless another caller got there first. Returns whichever
    /// pool ends up registered.
    pub fn insert_if_absent(&self, network: NetworkId, pool: AddressPool) -> SharedPool {
        let entry = self
            .pools
            .entry(network)
            .or_insert_with(|| Arc::new(Mutex::new(pool)));
        Arc::clone(entry.value())
    }

    /// The cached pool for `network`, or the result of `load` cached in its
    /// place. `load` runs at most once per network while the entry is held,
    /// so concurrent callers never rebuild the same pool twice.
    pub fn get_or_try_load<E>(
        &self,
        network: NetworkId,
        load: impl FnOnce() -> Result<AddressPool, E>,
    ) -> Result<SharedPool, E> {
        match self.pools.entry(network) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let shared = Arc::new(Mutex::new(load()?));
                entry.insert(Arc::clone(&shared));
                Ok(shared)
            }
        }
    }

    /// Drop the cached pool for `network`. Returns `true` if one was cached.
    pub fn evict(&self, network: &NetworkId) -> bool {
        self.pools.remove(network).is_some()
    }

    pub fn contains(&self, network: &NetworkId) -> bool {
        self.pools.contains_key(network)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
