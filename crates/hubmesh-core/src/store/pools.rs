// ── Address pool snapshots ──

use redb::WriteTransaction;

use super::tables;
use super::{Store, get_record, put_record};
use crate::error::{CoreError, Result};
use crate::model::NetworkId;
use crate::pool::PoolSnapshot;

impl Store {
    /// Overwrite the stored pool snapshot for `network`.
    pub fn save_pool_snapshot(&self, network: &NetworkId, snapshot: &PoolSnapshot) -> Result<()> {
        self.write(|txn| write_pool(txn, network, snapshot))
    }

    pub fn pool_snapshot(&self, network: &NetworkId) -> Result<PoolSnapshot> {
        self.read(|txn| {
            get_record(&txn.open_table(tables::ADDRESS_POOLS)?, &network.to_string())?
                .ok_or_else(|| CoreError::not_found("address pool", network))
        })
    }
}

pub(super) fn write_pool(
    txn: &WriteTransaction,
    network: &NetworkId,
    snapshot: &PoolSnapshot,
) -> Result<()> {
    put_record(
        &mut txn.open_table(tables::ADDRESS_POOLS)?,
        &network.to_string(),
        snapshot,
    )
}
