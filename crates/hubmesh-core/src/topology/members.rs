// ── Member lifecycle ──

use tracing::{debug, warn};

use super::requests::{CreateMemberRequest, UpdateMemberRequest};
use super::{TopologyManager, lock};
use crate::error::{CoreError, Result};
use crate::model::{Member, MemberKind};
use crate::store::{MemberChanges, MemberDraft};

impl TopologyManager {
    /// Allocate an address and persist a new member.
    ///
    /// Either the member record and the advanced pool are both committed, or
    /// neither is: exhaustion, key generation failure and storage failure
    /// all leave the address unconsumed.
    pub fn create_member(&self, network_name: &str, request: CreateMemberRequest) -> Result<Member> {
        let kind = request.kind.unwrap_or_default();
        self.validator.entity_name("member name", &request.name)?;
        self.check_public_address(kind, &request.public_address)?;
        let port = self.resolve_port(request.port, self.config.default_listen_port)?;
        let network = self.store.network_by_name(network_name)?;

        let shared = self.reconcile(&network)?;
        let mut pool = lock(&shared)?;
        let mut draft = pool.clone();
        let address = draft.allocate()?;

        let keys = match self.keys.generate() {
            Ok(keys) => keys,
            Err(err) => {
                debug!(%address, "key generation failed, address returned to pool");
                return Err(err);
            }
        };

        let member = self.store.create_member(
            MemberDraft {
                network_id: network.id,
                name: request.name,
                public_address: request.public_address,
                port,
                address,
                kind,
                keys,
            },
            Some(&draft.export()),
        )?;
        *pool = draft;
        Ok(member)
    }

    pub fn member(&self, network_name: &str, member_name: &str) -> Result<Member> {
        let network = self.store.network_by_name(network_name)?;
        self.store.member_by_name(&network.id, member_name)
    }

    /// Members of a network, ordered by name.
    pub fn list_members(&self, network_name: &str) -> Result<Vec<Member>> {
        let network = self.store.network_by_name(network_name)?;
        self.store.list_members(&network.id)
    }

    /// Change a member's address, port or kind. The public-address rule is
    /// checked against the kind the member will have after the update. The
    /// overlay address never changes.
    pub fn update_member(
        &self,
        network_name: &str,
        member_name: &str,
        request: UpdateMemberRequest,
    ) -> Result<Member> {
        let network = self.store.network_by_name(network_name)?;
        let member = self.store.member_by_name(&network.id, member_name)?;

        let kind = request.kind.unwrap_or(member.kind);
        let public_address = request.public_address.unwrap_or(member.public_address);
        self.check_public_address(kind, &public_address)?;
        let port = self.resolve_port(request.port, member.port)?;

        self.store.update_member(
            &member.id,
            &MemberChanges {
                public_address,
                port,
                kind,
            },
        )
    }

    /// Delete a member and return its address to the pool.
    pub fn delete_member(&self, network_name: &str, member_name: &str) -> Result<Member> {
        let network = self.store.network_by_name(network_name)?;
        let shared = self.reconcile(&network)?;
        let mut pool = lock(&shared)?;

        let member = self.store.member_by_name(&network.id, member_name)?;
        let mut draft = pool.clone();
        if let Err(err) = draft.release(member.address) {
            // The record is going away regardless; the pool just had no
            // claim on this address.
            warn!(
                network = %network.name,
                member = %member.name,
                error = %err,
                "address release failed during member delete"
            );
        }

        let deleted = self
            .store
            .delete_member(&network.id, member_name, Some(&draft.export()))?;
        *pool = draft;
        Ok(deleted)
    }

    fn check_public_address(&self, kind: MemberKind, public_address: &str) -> Result<()> {
        if public_address.is_empty() {
            if kind.requires_public_address() {
                return Err(CoreError::validation(
                    "public address",
                    format!("a {kind} member needs a reachable public address"),
                ));
            }
            return Ok(());
        }
        self.validator.public_address(public_address)
    }
}
