//! Per-step resource accounting: which addresses a call touches, and how.

use crate::foundation::constants::RESOURCE_CEILING;
use crate::foundation::{Address, EngineError, Result};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How one call accesses one address. Flags only ever widen when merged.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct Access {
    pub writable: bool,
    pub signer: bool,
}

impl Access {
    pub const READ_ONLY: Access = Access { writable: false, signer: false };
    pub const WRITABLE: Access = Access { writable: true, signer: false };
    pub const WRITABLE_SIGNER: Access = Access { writable: true, signer: true };

    fn widen(&mut self, other: Access) {
        self.writable |= other.writable;
        self.signer |= other.signer;
    }
}

/// One declared resource of an instruction: address plus access mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize, BorshDeserialize, BorshSerialize)]
pub struct ResourceClaim {
    pub address: Address,
    pub writable: bool,
    pub signer: bool,
}

impl ResourceClaim {
    pub fn read_only(address: Address) -> Self {
        Self { address, writable: false, signer: false }
    }

    pub fn writable(address: Address) -> Self {
        Self { address, writable: true, signer: false }
    }

    pub fn writable_signer(address: Address) -> Self {
        Self { address, writable: true, signer: true }
    }

    pub fn readonly_signer(address: Address) -> Self {
        Self { address, writable: false, signer: true }
    }

    pub fn access(&self) -> Access {
        Access { writable: self.writable, signer: self.signer }
    }
}

/// Deduplicated address -> access map for one step.
///
/// Merging is monotonic-OR: an address already writable (or signing) never
/// loses the flag when re-merged read-only, regardless of merge order.
#[derive(Clone, Debug, Default)]
pub struct WorkingSet {
    entries: BTreeMap<Address, Access>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_claims(claims: &[ResourceClaim]) -> Self {
        let mut set = Self::new();
        set.merge_claims(claims);
        set
    }

    pub fn insert(&mut self, claim: ResourceClaim) {
        self.entries.entry(claim.address).or_default().widen(claim.access());
    }

    pub fn merge_claims(&mut self, claims: &[ResourceClaim]) {
        for claim in claims {
            self.insert(*claim);
        }
    }

    pub fn get(&self, address: &Address) -> Option<Access> {
        self.entries.get(address).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.entries.contains_key(address)
    }

    /// Ordered claim list (address order is deterministic across hosts).
    pub fn claims(&self) -> Vec<ResourceClaim> {
        self.entries
            .iter()
            .map(|(address, access)| ResourceClaim { address: *address, writable: access.writable, signer: access.signer })
            .collect()
    }

    /// Fail fast when the merged set would exceed the per-call ceiling.
    pub fn ensure_within_ceiling(&self) -> Result<()> {
        if self.entries.len() > RESOURCE_CEILING {
            return Err(EngineError::WorkingSetOverflow { resources: self.entries.len(), ceiling: RESOURCE_CEILING });
        }
        Ok(())
    }
}
