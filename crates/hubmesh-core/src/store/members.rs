// ── Member records ──

use std::net::Ipv4Addr;

use chrono::Utc;
use redb::ReadableTable;
use tracing::info;

use super::networks::dangling;
use super::pools::write_pool;
use super::tables::{self, scoped_name_key, scoped_name_range};
use super::{Store, get_index, get_record, put_record, scan_index};
use crate::error::{CoreError, Result};
use crate::keys::KeyPair;
use crate::model::{Member, MemberId, MemberKind, NetworkId};
use crate::pool::PoolSnapshot;

/// Everything needed to persist a member. The store assigns id and
/// timestamps.
#[derive(Debug, Clone)]
pub struct MemberDraft {
    pub network_id: NetworkId,
    pub name: String,
    pub public_address: String,
    pub port: u16,
    pub address: Ipv4Addr,
    pub kind: MemberKind,
    pub keys: KeyPair,
}

/// Mutable fields of a member. Name and overlay address never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberChanges {
    pub public_address: String,
    pub port: u16,
    pub kind: MemberKind,
}

impl Store {
    /// Persist a member and, when given, the pool snapshot that accounts
    /// for its address.
    pub fn create_member(&self, draft: MemberDraft, pool: Option<&PoolSnapshot>) -> Result<Member> {
        let member = self.write(|txn| {
            if txn
                .open_table(tables::NETWORKS)?
                .get(draft.network_id.to_string().as_str())?
                .is_none()
            {
                return Err(CoreError::not_found("network", draft.network_id));
            }

            let name_key = scoped_name_key(&draft.network_id, &draft.name);
            let mut by_name = txn.open_table(tables::MEMBERS_BY_NAME)?;
            if by_name.get(name_key.as_str())?.is_some()
                || get_index(&txn.open_table(tables::HUBS_BY_NAME)?, &name_key)?.is_some()
            {
                return Err(CoreError::duplicate("member", &draft.name));
            }

            let now = Utc::now();
            let member = Member {
                id: MemberId::new(),
                network_id: draft.network_id,
                name: draft.name.clone(),
                public_address: draft.public_address.clone(),
                port: draft.port,
                address: draft.address,
                kind: draft.kind,
                keys: draft.keys.clone(),
                created_at: now,
                updated_at: now,
            };
            let id = member.id.to_string();
            put_record(&mut txn.open_table(tables::MEMBERS)?, &id, &member)?;
            by_name.insert(name_key.as_str(), id.as_str())?;
            if let Some(snapshot) = pool {
                write_pool(txn, &draft.network_id, snapshot)?;
            }
            Ok(member)
        })?;

        info!(
            member = %member.name,
            kind = %member.kind,
            address = %member.address,
            "member created"
        );
        Ok(member)
    }

    pub fn member_by_name(&self, network: &NetworkId, name: &str) -> Result<Member> {
        self.read(|txn| {
            let key = scoped_name_key(network, name);
            let id = get_index(&txn.open_table(tables::MEMBERS_BY_NAME)?, &key)?
                .ok_or_else(|| CoreError::not_found("member", name))?;
            get_record(&txn.open_table(tables::MEMBERS)?, &id)?
                .ok_or_else(|| dangling("member", name))
        })
    }

    /// Members of `network`, ordered by name.
    pub fn list_members(&self, network: &NetworkId) -> Result<Vec<Member>> {
        self.read(|txn| {
            let (lo, hi) = scoped_name_range(network);
            let records = txn.open_table(tables::MEMBERS)?;
            scan_index(&txn.open_table(tables::MEMBERS_BY_NAME)?, &lo, &hi)?
                .into_iter()
                .map(|(key, id)| {
                    get_record::<Member, _>(&records, &id)?
                        .ok_or_else(|| dangling("member", &key))
                })
                .collect()
        })
    }

    pub fn update_member(&self, id: &MemberId, changes: &MemberChanges) -> Result<Member> {
        self.write(|txn| {
            let key = id.to_string();
            let mut records = txn.open_table(tables::MEMBERS)?;
            let mut member: Member =
                get_record(&records, &key)?.ok_or_else(|| CoreError::not_found("member", id))?;
            member.public_address.clone_from(&changes.public_address);
            member.port = changes.port;
            member.kind = changes.kind;
            member.updated_at = Utc::now();
            put_record(&mut records, &key, &member)?;
            Ok(member)
        })
    }

    /// Remove a member and its index row, writing `pool` in the same
    /// transaction when given.
    pub fn delete_member(
        &self,
        network: &NetworkId,
        name: &str,
        pool: Option<&PoolSnapshot>,
    ) -> Result<Member> {
        let member = self.write(|txn| {
            let name_key = scoped_name_key(network, name);
            let mut by_name = txn.open_table(tables::MEMBERS_BY_NAME)?;
            let id = get_index(&by_name, &name_key)?
                .ok_or_else(|| CoreError::not_found("member", name))?;

            let mut records = txn.open_table(tables::MEMBERS)?;
            let member: Member =
                get_record(&records, &id)?.ok_or_else(|| dangling("member", name))?;
            records.remove(id.as_str())?;
            by_name.remove(name_key.as_str())?;
            if let Some(snapshot) = pool {
                write_pool(txn, network, snapshot)?;
            }
            Ok(member)
        })?;

        info!(member = %member.name, address = %member.address, "member deleted");
        Ok(member)
    }
}
