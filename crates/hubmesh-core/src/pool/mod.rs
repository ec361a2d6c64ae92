//! Per-network address allocator.
//!
//! An [`AddressPool`] hands out overlay addresses from one IPv4 block. The
//! first usable address belongs to the hub and is allocated from the start;
//! members draw from a recycle FIFO first and otherwise from a sequential
//! cursor. The pool round-trips through [`PoolSnapshot`] so allocation
//! history survives a restart.

mod registry;

pub use registry::{PoolRegistry, SharedPool};

use std::collections::{BTreeSet, VecDeque};
use std::net::Ipv4Addr;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::validate::parse_cidr;

/// Current persisted layout of [`PoolSnapshot`].
pub const SNAPSHOT_FORMAT: u32 = 1;

/// Index of the hub address relative to the first usable address.
const HUB_INDEX: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressPool {
    cidr: Ipv4Net,
    /// Numeric value of the first usable address (the hub's).
    first: u32,
    /// Block size minus the network and broadcast addresses.
    usable: u32,
    allocated: BTreeSet<Ipv4Addr>,
    recycled: VecDeque<Ipv4Addr>,
    /// Next never-used index. Index 0 is the hub.
    cursor: u32,
}

/// Serializable state of an [`AddressPool`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    #[serde(default = "default_format")]
    pub format: u32,
    pub cidr: Ipv4Net,
    pub hub_address: Ipv4Addr,
    /// Member addresses in use. Never contains the hub address.
    pub allocated: Vec<Ipv4Addr>,
    /// Released addresses, oldest first.
    pub recycled: Vec<Ipv4Addr>,
    pub cursor: u32,
}

fn default_format() -> u32 {
    SNAPSHOT_FORMAT
}

impl AddressPool {
    /// Build an empty pool over `cidr`.
    ///
    /// Rejects malformed input, IPv6 blocks, and blocks of two addresses or
    /// fewer (`/31`, `/32`), which leave no room for a hub.
    pub fn new(cidr: &str) -> Result<Self, CoreError> {
        Self::from_net(parse_cidr(cidr)?)
    }

    pub fn from_net(net: Ipv4Net) -> Result<Self, CoreError> {
        let net = net.trunc();
        let total = 1u64 << (32 - u32::from(net.prefix_len()));
        if total <= 2 {
            return Err(CoreError::validation(
                "cidr",
                format!("{net} is too small; a network needs at least 3 addresses"),
            ));
        }
        let usable = u32::try_from(total - 2)
            .map_err(|_| CoreError::Internal(format!("block size of {net} overflows")))?;
        let first = u32::from(net.network()) + 1;

        let mut allocated = BTreeSet::new();
        allocated.insert(Ipv4Addr::from(first));

        Ok(Self {
            cidr: net,
            first,
            usable,
            allocated,
            recycled: VecDeque::new(),
            cursor: HUB_INDEX + 1,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn cidr(&self) -> Ipv4Net {
        self.cidr
    }

    /// The fixed hub address (first usable address of the block).
    pub fn hub_address(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.first)
    }

    /// Number of addresses available to members over the pool's lifetime.
    pub fn capacity(&self) -> u32 {
        self.usable - 1
    }

    /// Addresses a further `allocate` call could still return. Indices at or
    /// past the cursor that are already marked do not count.
    pub fn available(&self) -> u32 {
        let fresh = if self.cursor < self.usable {
            let marked = self.allocated.range(self.address_at(self.cursor)..).count();
            (self.usable - self.cursor).saturating_sub(u32::try_from(marked).unwrap_or(u32::MAX))
        } else {
            0
        };
        let recycled = u32::try_from(self.recycled.len()).unwrap_or(u32::MAX);
        fresh.saturating_add(recycled)
    }

    pub fn is_allocated(&self, address: Ipv4Addr) -> bool {
        self.allocated.contains(&address)
    }

    /// Member addresses currently in use, ascending.
    pub fn allocated(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        let hub = self.hub_address();
        self.allocated.iter().copied().filter(move |a| *a != hub)
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    // ── Allocation ───────────────────────────────────────────────────

    /// Hand out a member address: the oldest released one if any, otherwise
    /// the next never-used one.
    pub fn allocate(&mut self) -> Result<Ipv4Addr, CoreError> {
        if let Some(address) = self.recycled.pop_front() {
            self.allocated.insert(address);
            return Ok(address);
        }

        while self.cursor < self.usable {
            let address = self.address_at(self.cursor);
            self.cursor += 1;
            // Skips indices marked out of band (snapshot from an older layout).
            if self.allocated.insert(address) {
                return Ok(address);
            }
        }

        Err(CoreError::PoolExhausted {
            cidr: self.cidr.to_string(),
            capacity: self.capacity(),
        })
    }

    /// Return a member address to the tail of the recycle FIFO.
    pub fn release(&mut self, address: Ipv4Addr) -> Result<(), CoreError> {
        if address == self.hub_address() {
            return Err(CoreError::InvalidRelease {
                address,
                reason: "the hub address is permanently reserved".into(),
            });
        }
        if !self.allocated.remove(&address) {
            return Err(CoreError::InvalidRelease {
                address,
                reason: "address is not allocated".into(),
            });
        }
        self.recycled.push_back(address);
        Ok(())
    }

    // ── Reconstruction ───────────────────────────────────────────────

    /// Record an address found on a live record. Leaves cursor and recycle
    /// queue untouched; call [`resync_cursor`](Self::resync_cursor) after the
    /// last mark.
    pub fn mark_allocated(&mut self, address: Ipv4Addr) -> Result<(), CoreError> {
        if self.index_of(address).is_none() {
            return Err(CoreError::validation(
                "address",
                format!("{address} is not a usable address of {}", self.cidr),
            ));
        }
        if !self.allocated.insert(address) {
            return Err(CoreError::AddressConflict { address });
        }
        Ok(())
    }

    /// Move the cursor one past the highest marked index.
    pub fn resync_cursor(&mut self) {
        let highest = self
            .allocated
            .iter()
            .filter_map(|a| self.index_of(*a))
            .max()
            .unwrap_or(HUB_INDEX);
        self.cursor = highest + 1;
    }

    // ── Persistence ──────────────────────────────────────────────────

    pub fn export(&self) -> PoolSnapshot {
        PoolSnapshot {
            format: SNAPSHOT_FORMAT,
            cidr: self.cidr,
            hub_address: self.hub_address(),
            allocated: self.allocated().collect(),
            recycled: self.recycled.iter().copied().collect(),
            cursor: self.cursor,
        }
    }

    /// Rebuild a pool from a snapshot. The hub address is re-marked as
    /// permanently allocated.
    pub fn import(snapshot: &PoolSnapshot) -> Result<Self, CoreError> {
        if snapshot.format > SNAPSHOT_FORMAT {
            return Err(CoreError::validation(
                "pool snapshot",
                format!("unsupported format {}", snapshot.format),
            ));
        }
        let mut pool = Self::from_net(snapshot.cidr)?;
        if snapshot.hub_address != pool.hub_address() {
            return Err(CoreError::validation(
                "pool snapshot",
                format!(
                    "hub address {} does not match {} for {}",
                    snapshot.hub_address,
                    pool.hub_address(),
                    pool.cidr
                ),
            ));
        }
        if snapshot.cursor == HUB_INDEX || snapshot.cursor > pool.usable {
            return Err(CoreError::validation(
                "pool snapshot",
                format!("cursor {} is outside 1..={}", snapshot.cursor, pool.usable),
            ));
        }

        for &address in &snapshot.allocated {
            pool.mark_allocated(address)?;
        }
        for &address in &snapshot.recycled {
            if pool.index_of(address).is_none() || pool.is_allocated(address) {
                return Err(CoreError::validation(
                    "pool snapshot",
                    format!("recycled address {address} is invalid or still allocated"),
                ));
            }
            pool.recycled.push_back(address);
        }
        pool.cursor = snapshot.cursor;
        Ok(pool)
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn address_at(&self, index: u32) -> Ipv4Addr {
        Ipv4Addr::from(self.first + index)
    }

    /// Offset from the hub address, if `address` is a usable address.
    fn index_of(&self, address: Ipv4Addr) -> Option<u32> {
        let index = u32::from(address).checked_sub(self.first)?;
        (index < self.usable).then_some(index)
    }
}
