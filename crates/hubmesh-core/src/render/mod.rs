// ── Config generator ──
//
// Reads the current hub and members of a network, renders one document per
// entity, and versions the result by content hash. Nothing here mutates
// topology state.

pub mod document;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::model::{ConfigSnapshot, Network, SaveOutcome};
use crate::store::Store;

pub use document::{content_hash, endpoint};

/// Documents rendered from the current state of one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedConfig {
    pub network: Network,
    /// Entity name (hub or member) to document text.
    pub documents: BTreeMap<String, String>,
    pub content_hash: String,
}

#[derive(Debug, Clone)]
pub struct ConfigGenerator {
    store: Arc<Store>,
}

impl ConfigGenerator {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Render every document of a network. Fails with `NotFound` when the
    /// network has no hub.
    pub fn generate(&self, network_name: &str) -> Result<GeneratedConfig> {
        let network = self.store.network_by_name(network_name)?;
        let hub = self.store.hub_by_network(&network.id).map_err(|err| {
            if err.is_not_found() {
                CoreError::not_found("hub", format!("network '{network_name}'"))
            } else {
                err
            }
        })?;
        let members = self.store.list_members(&network.id)?;

        let mut documents = BTreeMap::new();
        documents.insert(hub.name.clone(), document::hub_document(&hub, &members));
        for member in &members {
            documents.insert(
                member.name.clone(),
                document::member_document(&network, &hub, member, &members),
            );
        }
        let content_hash = content_hash(&documents);
        debug!(network = %network.name, documents = documents.len(), %content_hash, "configs rendered");

        Ok(GeneratedConfig {
            network,
            documents,
            content_hash,
        })
    }

    /// Persist the current documents as a new version unless they hash the
    /// same as the latest stored version.
    pub fn save_version(&self, network_name: &str) -> Result<SaveOutcome> {
        let generated = self.generate(network_name)?;
        let network_id = generated.network.id;

        let outcome = self.store.save_config_snapshot_if_changed(
            &network_id,
            &generated.content_hash,
            generated.documents,
        )?;
        match outcome {
            SaveOutcome::Created(ref snapshot) => info!(
                network = %network_name,
                version = snapshot.version,
                hash = %snapshot.content_hash,
                "config version saved"
            ),
            SaveOutcome::Unchanged(ref snapshot) => {
                debug!(network = %network_name, version = snapshot.version, "config unchanged");
            }
        }
        Ok(outcome)
    }

    /// Every saved version of a network, oldest first. Empty when nothing
    /// has been saved yet.
    pub fn history(&self, network_name: &str) -> Result<Vec<ConfigSnapshot>> {
        let network = self.store.network_by_name(network_name)?;
        self.store.list_config_snapshots(&network.id)
    }

    pub fn version(&self, network_name: &str, version: u32) -> Result<ConfigSnapshot> {
        let network = self.store.network_by_name(network_name)?;
        self.store.config_snapshot(&network.id, version)
    }

    pub fn latest(&self, network_name: &str) -> Result<ConfigSnapshot> {
        let network = self.store.network_by_name(network_name)?;
        self.store.latest_config_snapshot(&network.id)
    }

    pub fn config_hash_by_version(&self, network_name: &str, version: u32) -> Result<String> {
        let network = self.store.network_by_name(network_name)?;
        self.store.config_hash_by_version(&network.id, version)
    }
}
