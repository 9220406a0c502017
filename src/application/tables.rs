//! Caller-owned compaction-table session.
//!
//! Registration replaces the cached set wholesale; extension appends to the
//! remote table in bounded chunks, one orchestrated call at a time.

use crate::application::orchestrator::{CallRequest, TransactionOrchestrator};
use crate::domain::instruction::Instruction;
use crate::domain::resource::ResourceClaim;
use crate::domain::tables::{CompactionTable, TableSet};
use crate::domain::ControllerProfile;
use crate::foundation::constants::TABLE_EXTEND_CHUNK;
use crate::foundation::{Address, EngineError, Result};
use crate::infrastructure::rpc::ProgramRpc;
use borsh::BorshSerialize;
use log::{debug, info};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Operation name of the table-extend instruction.
pub const EXTEND_OP: &str = "extend_table";

#[derive(BorshSerialize)]
struct ExtendArgs<'a> {
    table: Address,
    addresses: &'a [Address],
}

/// Holds the tables envelopes compile against. Created once by the caller
/// and replaced or invalidated explicitly; nothing is shared process-wide.
pub struct TableSession {
    rpc: Arc<dyn ProgramRpc>,
    set: TableSet,
}

impl TableSession {
    pub fn new(rpc: Arc<dyn ProgramRpc>) -> Self {
        Self { rpc, set: TableSet::default() }
    }

    /// The current registration, for envelope compilation.
    pub fn set(&self) -> &TableSet {
        &self.set
    }

    /// Fetch `ids` and replace any prior registration wholesale.
    pub async fn register_active(&mut self, ids: &[Address]) -> Result<()> {
        let mut tables = BTreeMap::new();
        for id in ids {
            let table = self.rpc.fetch_reference_table(id).await?;
            debug!("table registered id={} entries={} capacity={}", id, table.addresses.len(), table.capacity);
            tables.insert(*id, table);
        }
        self.set = TableSet::new(tables);
        Ok(())
    }

    pub fn invalidate(&mut self) {
        self.set = TableSet::default();
    }

    /// Append `candidates` not already present in `table`, in chunks sized
    /// to the per-call resource ceiling. Calls run sequentially so each
    /// chunk acts on a committed predecessor. Returns the number of
    /// orchestrated calls issued. Append-only: nothing is ever removed.
    pub async fn extend(
        &mut self,
        orchestrator: &TransactionOrchestrator,
        profile: &ControllerProfile,
        authority: &str,
        table: Address,
        candidates: &[Address],
    ) -> Result<usize> {
        if candidates.is_empty() {
            return Ok(0);
        }

        // Re-read fresh rather than trusting the registration cache.
        let current = self.rpc.fetch_reference_table(&table).await?;
        let mut missing = Vec::new();
        for candidate in candidates {
            if !current.contains(candidate) && !missing.contains(candidate) {
                missing.push(*candidate);
            }
        }
        if missing.is_empty() {
            debug!("table extend no-op table={} candidates={}", table, candidates.len());
            return Ok(0);
        }
        if (current.addresses.len() + missing.len()) as u32 > current.capacity {
            return Err(EngineError::config(format!(
                "table {table} cannot hold {} more addresses (capacity {}, occupied {})",
                missing.len(),
                current.capacity,
                current.addresses.len()
            )));
        }

        let compile_set = self.set.clone();
        let mut calls = 0;
        for chunk in missing.chunks(TABLE_EXTEND_CHUNK) {
            let mut claims = vec![
                ResourceClaim::writable(table),
                ResourceClaim::read_only(profile.authority),
                ResourceClaim::read_only(profile.system_resource),
            ];
            claims.extend(chunk.iter().map(|address| ResourceClaim::read_only(*address)));
            let instruction = Instruction::tagged(
                profile.table_program,
                EXTEND_OP,
                &ExtendArgs { table, addresses: chunk },
                claims,
            )?;
            let request = CallRequest {
                instructions: vec![instruction],
                signer_names: vec![authority.to_string()],
                budget: None,
                requested_events: Vec::new(),
            };
            orchestrator.execute(request, &compile_set).await?;
            calls += 1;
            debug!("table extend chunk committed table={} chunk_len={} calls={}", table, chunk.len(), calls);
        }

        info!("table extended table={} appended={} calls={}", table, missing.len(), calls);
        Ok(calls)
    }
}
