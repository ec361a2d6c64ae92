// ── Pool reconciliation ──
//
// Before the first allocate or release for a network the manager needs a
// live pool. Sources, in order: the registry cache, the persisted snapshot,
// a rebuild from the live hub and member records. A rebuild is persisted
// only when no snapshot existed; an unreadable snapshot is left in place.

use tracing::{debug, info, warn};

use super::TopologyManager;
use crate::error::{CoreError, Result};
use crate::model::Network;
use crate::pool::{AddressPool, PoolSnapshot, SharedPool};

impl TopologyManager {
    pub(super) fn reconcile(&self, network: &Network) -> Result<SharedPool> {
        self.pools.get_or_try_load(network.id, || self.load_pool(network))
    }

    fn load_pool(&self, network: &Network) -> Result<AddressPool> {
        match self.store.pool_snapshot(&network.id) {
            Ok(snapshot) => match restore(network, &snapshot) {
                Ok(pool) => {
                    debug!(network = %network.name, cursor = pool.cursor(), "pool restored from snapshot");
                    Ok(pool)
                }
                Err(err) => {
                    warn!(
                        network = %network.name,
                        error = %err,
                        "pool snapshot unusable, rebuilding from records"
                    );
                    self.rebuild(network)
                }
            },
            Err(err) if err.is_not_found() => {
                let pool = self.rebuild(network)?;
                self.store.save_pool_snapshot(&network.id, &pool.export())?;
                info!(
                    network = %network.name,
                    allocated = pool.allocated().count(),
                    "pool rebuilt from records and persisted"
                );
                Ok(pool)
            }
            Err(err) => Err(err),
        }
    }

    /// Fresh pool with every live address marked. Marking conflicts are
    /// logged, not fatal.
    fn rebuild(&self, network: &Network) -> Result<AddressPool> {
        let mut pool = AddressPool::from_net(network.cidr)?;

        match self.store.hub_by_network(&network.id) {
            Ok(hub) if hub.address != pool.hub_address() => {
                warn!(
                    network = %network.name,
                    hub = %hub.name,
                    address = %hub.address,
                    expected = %pool.hub_address(),
                    "hub address is not the first usable address"
                );
                if let Err(err) = pool.mark_allocated(hub.address) {
                    warn!(network = %network.name, error = %err, "could not mark hub address");
                }
            }
            Ok(_) => {}
            Err(err) if err.is_not_found() => {}
            Err(err) => return Err(err),
        }

        for member in self.store.list_members(&network.id)? {
            if let Err(err) = pool.mark_allocated(member.address) {
                warn!(
                    network = %network.name,
                    member = %member.name,
                    error = %err,
                    "address conflict while rebuilding pool"
                );
            }
        }
        pool.resync_cursor();
        Ok(pool)
    }
}

fn restore(network: &Network, snapshot: &PoolSnapshot) -> Result<AddressPool> {
    let pool = AddressPool::import(snapshot)?;
    if pool.cidr() != network.cidr {
        return Err(CoreError::validation(
            "pool snapshot",
            format!("block {} does not match network block {}", pool.cidr(), network.cidr),
        ));
    }
    Ok(pool)
}
