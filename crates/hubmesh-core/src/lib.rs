//! Address allocation, durable storage, topology management and
//! configuration generation for hub-and-spoke overlay networks.
//!
//! - **[`TopologyManager`]**: entity lifecycle for networks, hubs and
//!   members. Validates input through a [`Validator`], obtains key material
//!   from a [`KeyGenerator`], and keeps one live [`AddressPool`] per network
//!   in its [`PoolRegistry`].
//!
//! - **[`Store`]**: single-file transactional store on `redb`. Every
//!   multi-row mutation (cascade delete, record plus pool snapshot) commits
//!   atomically.
//!
//! - **[`AddressPool`]**: per-network allocator with a fixed hub address, a
//!   recycle FIFO and a sequential cursor; persisted as a [`PoolSnapshot`].
//!
//! - **[`ConfigGenerator`]**: renders one overlay document per entity under
//!   peer/route visibility rules and versions the set by SHA-256 content
//!   hash.
//!
//! The API is synchronous. Callers build [`StoreConfig`] and
//! [`TopologyConfig`] themselves; this crate never reads configuration
//! files or the environment.

pub mod config;
pub mod error;
pub mod keys;
pub mod model;
pub mod pool;
pub mod render;
pub mod store;
pub mod testing;
pub mod topology;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_LISTEN_PORT, StoreConfig, TopologyConfig};
pub use error::CoreError;
pub use keys::{KeyGenerator, KeyPair, X25519KeyGenerator};
pub use pool::{AddressPool, PoolRegistry, PoolSnapshot};
pub use render::{ConfigGenerator, GeneratedConfig, content_hash, endpoint};
pub use store::Store;
pub use topology::requests::*;
pub use topology::TopologyManager;
pub use validate::{DefaultValidator, Validator};

// ── Model re-exports ────────────────────────────────────────────────
pub use model::{
    ConfigSnapshot, Hub, HubId, Member, MemberId, MemberKind, Network, NetworkId, SaveOutcome,
    SnapshotId,
};
