// ── Domain model ──
//
// Record shapes persisted by the store and returned by the public API.

pub mod entity_id;
pub mod hub;
pub mod member;
pub mod network;
pub mod snapshot;

pub use entity_id::{HubId, MemberId, NetworkId, SnapshotId};
pub use hub::Hub;
pub use member::{Member, MemberKind};
pub use network::Network;
pub use snapshot::{ConfigSnapshot, SaveOutcome};
