// ── Config snapshot types ──

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::{NetworkId, SnapshotId};

/// One hashed, versioned set of generated documents for a network.
///
/// Versions are contiguous per network starting at 1. `documents` maps the
/// entity name (hub or member) to its rendered text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub id: SnapshotId,
    pub network_id: NetworkId,
    pub version: u32,
    pub content_hash: String,
    pub documents: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// Result of asking the generator to persist the current configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// A new version was appended.
    Created(ConfigSnapshot),
    /// Content matched the latest version; nothing was written.
    Unchanged(ConfigSnapshot),
}

impl SaveOutcome {
    pub fn snapshot(&self) -> &ConfigSnapshot {
        match self {
            Self::Created(s) | Self::Unchanged(s) => s,
        }
    }

    pub fn into_snapshot(self) -> ConfigSnapshot {
        match self {
            Self::Created(s) | Self::Unchanged(s) => s,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}
