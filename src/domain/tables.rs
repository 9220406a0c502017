//! Address-compaction tables: server-side address registries referenced by
//! short indices to shrink envelope encoding.

use crate::foundation::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of one remote table: append-only ordered address sequence plus
/// capacity metadata.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct CompactionTable {
    pub addresses: Vec<Address>,
    pub capacity: u32,
}

impl CompactionTable {
    pub fn position(&self, address: &Address) -> Option<u32> {
        self.addresses.iter().position(|entry| entry == address).map(|idx| idx as u32)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.position(address).is_some()
    }

    pub fn remaining_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.addresses.len() as u32)
    }
}

/// Where a compacted address lives: which table, at which index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TableSlot {
    pub table: Address,
    pub index: u32,
}

/// The set of tables an envelope may compile against. Owned by a
/// `TableSession`; replaced wholesale on re-registration, never merged.
#[derive(Clone, Debug, Default)]
pub struct TableSet {
    tables: BTreeMap<Address, CompactionTable>,
}

impl TableSet {
    pub fn new(tables: BTreeMap<Address, CompactionTable>) -> Self {
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn get(&self, id: &Address) -> Option<&CompactionTable> {
        self.tables.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &Address> {
        self.tables.keys()
    }

    /// First table (in id order) holding `address`.
    pub fn lookup(&self, address: &Address) -> Option<TableSlot> {
        self.tables
            .iter()
            .find_map(|(id, table)| table.position(address).map(|index| TableSlot { table: *id, index }))
    }
}
