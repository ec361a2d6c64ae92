// ── Durable transactional store ──
//
// A single redb database file holding every record kind plus the
// address-pool snapshots. Each public operation runs in exactly one redb
// transaction: multi-row mutations (create with uniqueness checks, cascade
// delete, record + pool snapshot) either commit together or not at all.

mod hubs;
mod members;
mod networks;
mod pools;
mod snapshots;
pub(crate) mod tables;

pub use hubs::HubDraft;
pub use members::{MemberChanges, MemberDraft};

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use redb::{Database, ReadTransaction, ReadableTable, Table, WriteTransaction};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::error::{CoreError, Result};

const INITIAL_LOCK_BACKOFF: Duration = Duration::from_millis(10);
const MAX_LOCK_BACKOFF: Duration = Duration::from_millis(200);

/// Handle to the persistent store.
pub struct Store {
    db: Database,
    path: Option<PathBuf>,
}

impl Store {
    /// Open (creating if needed) the database at `config.path`.
    ///
    /// While another handle holds the file lock, retries with backoff until
    /// `config.lock_timeout` elapses, then fails with
    /// [`CoreError::StorageUnavailable`].
    pub fn open(config: &StoreConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = open_with_lock_wait(&config.path, config.lock_timeout)?;
        let store = Self {
            db,
            path: Some(config.path.clone()),
        };
        store.create_tables()?;
        debug!(path = %config.path.display(), "store opened");
        Ok(store)
    }

    /// A store backed by memory only. Nothing survives the handle.
    pub fn open_in_memory() -> Result<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let store = Self { db, path: None };
        store.create_tables()?;
        Ok(store)
    }

    /// Database file, or `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn create_tables(&self) -> Result<()> {
        self.write(|txn| {
            for def in tables::RECORD_TABLES {
                txn.open_table(def)?;
            }
            for def in tables::INDEX_TABLES {
                txn.open_table(def)?;
            }
            Ok(())
        })
    }

    // ── Transaction helpers ──────────────────────────────────────────

    /// Run `f` inside one write transaction. Any error aborts every write
    /// made by `f`.
    pub(crate) fn write<T>(&self, f: impl FnOnce(&WriteTransaction) -> Result<T>) -> Result<T> {
        let txn = self.db.begin_write()?;
        match f(&txn) {
            Ok(out) => {
                txn.commit()?;
                Ok(out)
            }
            Err(err) => {
                if let Err(abort_err) = txn.abort() {
                    warn!(error = %abort_err, "failed to abort write transaction");
                }
                Err(err)
            }
        }
    }

    pub(crate) fn read<T>(&self, f: impl FnOnce(&ReadTransaction) -> Result<T>) -> Result<T> {
        let txn = self.db.begin_read()?;
        f(&txn)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("path", &self.path).finish_non_exhaustive()
    }
}

fn open_with_lock_wait(path: &Path, timeout: Duration) -> Result<Database> {
    let started = Instant::now();
    let mut backoff = INITIAL_LOCK_BACKOFF;
    loop {
        match Database::create(path) {
            Ok(db) => return Ok(db),
            Err(redb::DatabaseError::DatabaseAlreadyOpen) => {
                let waited = started.elapsed();
                if waited >= timeout {
                    return Err(CoreError::StorageUnavailable {
                        path: path.display().to_string(),
                        waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                    });
                }
                debug!(path = %path.display(), ?waited, "store locked, retrying");
                thread::sleep(backoff.min(timeout - waited));
                backoff = (backoff * 2).min(MAX_LOCK_BACKOFF);
            }
            Err(err) => return Err(err.into()),
        }
    }
}

// ── Row codecs ───────────────────────────────────────────────────────

pub(crate) fn get_record<T, Tbl>(table: &Tbl, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    Tbl: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key)? {
        Some(row) => Ok(Some(serde_json::from_slice(row.value())?)),
        None => Ok(None),
    }
}

pub(crate) fn put_record<T: Serialize>(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    table.insert(key, bytes.as_slice())?;
    Ok(())
}

pub(crate) fn get_index<Tbl>(table: &Tbl, key: &str) -> Result<Option<String>>
where
    Tbl: ReadableTable<&'static str, &'static str>,
{
    Ok(table.get(key)?.map(|row| row.value().to_owned()))
}

/// Every `(key, id)` pair of an index table within `[lo, hi)`.
pub(crate) fn scan_index<Tbl>(table: &Tbl, lo: &str, hi: &str) -> Result<Vec<(String, String)>>
where
    Tbl: ReadableTable<&'static str, &'static str>,
{
    let mut rows = Vec::new();
    for entry in table.range(lo..hi)? {
        let (key, value) = entry?;
        rows.push((key.value().to_owned(), value.value().to_owned()));
    }
    Ok(rows)
}
