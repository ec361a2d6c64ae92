// ── Core error types ──
//
// Every fallible operation in hubmesh-core returns `CoreError`. Storage
// engine failures are translated at the boundary so consumers only ever
// match on domain-level variants.

use std::net::Ipv4Addr;

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("{entity} name '{name}' already exists")]
    DuplicateName { entity: String, name: String },

    #[error("{entity} already exists for {identifier}")]
    AlreadyExists { entity: String, identifier: String },

    // ── Address pool errors ──────────────────────────────────────────
    #[error("no available addresses in {cidr} (capacity {capacity})")]
    PoolExhausted { cidr: String, capacity: u32 },

    #[error("cannot release {address}: {reason}")]
    InvalidRelease { address: Ipv4Addr, reason: String },

    #[error("address {address} is already marked allocated")]
    AddressConflict { address: Ipv4Addr },

    // ── Storage errors ───────────────────────────────────────────────
    #[error("store at {path} is locked by another process (waited {waited_ms}ms)")]
    StorageUnavailable { path: String, waited_ms: u64 },

    #[error("storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("failed to encode or decode a stored record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Capability errors ────────────────────────────────────────────
    #[error("key generation failed: {reason}")]
    KeyGeneration { reason: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(entity: &str, identifier: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.to_string(),
        }
    }

    pub(crate) fn duplicate(entity: &str, name: &str) -> Self {
        Self::DuplicateName {
            entity: entity.into(),
            name: name.into(),
        }
    }

    /// `true` for the "record is absent" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from storage-engine errors ────────────────────────────
//
// redb splits its failures across one type per phase. They all collapse
// into `redb::Error` first so callers can use `?` on any of them.

macro_rules! storage_error_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for CoreError {
                fn from(err: $ty) -> Self {
                    CoreError::Storage(err.into())
                }
            }
        )+
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
