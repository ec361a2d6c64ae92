// ── Config snapshots ──
//
// Append-only per network. Keys sort by version, so the newest snapshot is
// the last row of the network's key range.

use std::collections::BTreeMap;

use chrono::Utc;
use redb::{ReadableTable, Table, WriteTransaction};

use super::tables::{self, snapshot_key, snapshot_range};
use super::{Store, get_record, put_record};
use crate::error::{CoreError, Result};
use crate::model::{ConfigSnapshot, NetworkId, SaveOutcome, SnapshotId};

impl Store {
    /// Append a snapshot numbered one past the network's current maximum
    /// (1 for the first), unless the latest one already carries
    /// `content_hash`. The comparison and the append share one write
    /// transaction, so concurrent callers saving the same state append once.
    /// Never overwrites an existing version.
    pub fn save_config_snapshot_if_changed(
        &self,
        network: &NetworkId,
        content_hash: &str,
        documents: BTreeMap<String, String>,
    ) -> Result<SaveOutcome> {
        self.write(|txn| {
            ensure_network(txn, network)?;
            let mut table = txn.open_table(tables::CONFIG_SNAPSHOTS)?;
            let latest = last_in_range(&table, network)?;
            if let Some(latest) = latest.as_ref().filter(|s| s.content_hash == content_hash) {
                return Ok(SaveOutcome::Unchanged(latest.clone()));
            }
            append_snapshot(&mut table, network, latest.as_ref(), content_hash, documents)
                .map(SaveOutcome::Created)
        })
    }

    pub fn latest_config_snapshot(&self, network: &NetworkId) -> Result<ConfigSnapshot> {
        self.read(|txn| {
            last_in_range(&txn.open_table(tables::CONFIG_SNAPSHOTS)?, network)?
                .ok_or_else(|| CoreError::not_found("config version", format!("network {network}")))
        })
    }

    pub fn config_snapshot(&self, network: &NetworkId, version: u32) -> Result<ConfigSnapshot> {
        self.read(|txn| {
            get_record(
                &txn.open_table(tables::CONFIG_SNAPSHOTS)?,
                &snapshot_key(network, version),
            )?
            .ok_or_else(|| CoreError::not_found("config version", version))
        })
    }

    /// Every snapshot of `network`, oldest first.
    pub fn list_config_snapshots(&self, network: &NetworkId) -> Result<Vec<ConfigSnapshot>> {
        self.read(|txn| {
            let table = txn.open_table(tables::CONFIG_SNAPSHOTS)?;
            let (lo, hi) = snapshot_range(network);
            let mut snapshots = Vec::new();
            for entry in table.range(lo.as_str()..hi.as_str())? {
                let (_, value) = entry?;
                snapshots.push(serde_json::from_slice(value.value())?);
            }
            Ok(snapshots)
        })
    }

    pub fn config_hash_by_version(&self, network: &NetworkId, version: u32) -> Result<String> {
        Ok(self.config_snapshot(network, version)?.content_hash)
    }
}

fn ensure_network(txn: &WriteTransaction, network: &NetworkId) -> Result<()> {
    if txn
        .open_table(tables::NETWORKS)?
        .get(network.to_string().as_str())?
        .is_none()
    {
        return Err(CoreError::not_found("network", network));
    }
    Ok(())
}

fn append_snapshot(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    network: &NetworkId,
    latest: Option<&ConfigSnapshot>,
    content_hash: &str,
    documents: BTreeMap<String, String>,
) -> Result<ConfigSnapshot> {
    let version = match latest {
        Some(latest) => latest.version.checked_add(1).ok_or_else(|| {
            CoreError::Internal(format!("config version overflow for network {network}"))
        })?,
        None => 1,
    };

    let snapshot = ConfigSnapshot {
        id: SnapshotId::new(),
        network_id: *network,
        version,
        content_hash: content_hash.to_owned(),
        documents,
        created_at: Utc::now(),
    };
    put_record(table, &snapshot_key(network, version), &snapshot)?;
    Ok(snapshot)
}

fn last_in_range<Tbl>(table: &Tbl, network: &NetworkId) -> Result<Option<ConfigSnapshot>>
where
    Tbl: ReadableTable<&'static str, &'static [u8]>,
{
    let (lo, hi) = snapshot_range(network);
    match table.range(lo.as_str()..hi.as_str())?.next_back() {
        Some(entry) => {
            let (_, value) = entry?;
            Ok(Some(serde_json::from_slice(value.value())?))
        }
        None => Ok(None),
    }
}
