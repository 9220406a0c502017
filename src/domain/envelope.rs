//! Transaction envelopes: deterministic compilation, signing digest,
//! signature attachment.

use crate::domain::instruction::Instruction;
use crate::domain::resource::{Access, ResourceClaim, WorkingSet};
use crate::domain::tables::{TableSet, TableSlot};
use crate::foundation::{Address, BlockhashRef, EngineError, Hash32, Result, Signature};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MessageHeader {
    pub signer_count: u16,
    pub writable_count: u16,
    pub readonly_count: u16,
}

/// Addresses loaded from one compaction table instead of the static list.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct TableReference {
    pub table: Address,
    pub writable_indexes: Vec<u32>,
    pub readonly_indexes: Vec<u32>,
}

/// An instruction with its addresses replaced by indexes into the combined
/// resource space: static addresses first, then table-loaded writable, then
/// table-loaded read-only.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CompiledInstruction {
    pub program_index: u16,
    pub resource_indexes: Vec<u16>,
    pub payload: Vec<u8>,
}

/// One atomic call, compiled and ready to sign. Built fresh per attempt;
/// after signing the only remaining mutation is attaching further required
/// signatures.
#[derive(Clone, Debug)]
pub struct TransactionEnvelope {
    header: MessageHeader,
    static_addresses: Vec<Address>,
    blockhash: BlockhashRef,
    table_refs: Vec<TableReference>,
    instructions: Vec<CompiledInstruction>,
    signatures: BTreeMap<Address, Signature>,
}

impl TransactionEnvelope {
    pub fn header(&self) -> MessageHeader {
        self.header
    }

    pub fn fee_payer(&self) -> Address {
        self.static_addresses[0]
    }

    pub fn static_addresses(&self) -> &[Address] {
        &self.static_addresses
    }

    pub fn required_signers(&self) -> &[Address] {
        &self.static_addresses[..self.header.signer_count as usize]
    }

    pub fn table_refs(&self) -> &[TableReference] {
        &self.table_refs
    }

    pub fn instructions(&self) -> &[CompiledInstruction] {
        &self.instructions
    }

    pub fn expiry_height(&self) -> u64 {
        self.blockhash.expiry_height
    }

    /// Total distinct resources the call touches, static and table-loaded.
    pub fn resource_count(&self) -> usize {
        let loaded: usize =
            self.table_refs.iter().map(|r| r.writable_indexes.len() + r.readonly_indexes.len()).sum();
        self.static_addresses.len() + loaded
    }

    /// Canonical digest every signer signs.
    pub fn signing_digest(&self) -> Result<Hash32> {
        let message =
            (&self.header, &self.static_addresses, &self.blockhash, &self.table_refs, &self.instructions);
        let bytes = bincode::serialize(&message)?;
        Ok(*blake3::hash(&bytes).as_bytes())
    }

    pub fn attach_signature(&mut self, address: Address, signature: Signature) -> Result<()> {
        if !self.required_signers().contains(&address) {
            return Err(EngineError::config(format!("{address} is not a required signer of this envelope")));
        }
        self.signatures.insert(address, signature);
        Ok(())
    }

    pub fn signature_for(&self, address: &Address) -> Option<&Signature> {
        self.signatures.get(address)
    }

    pub fn is_fully_signed(&self) -> bool {
        self.required_signers().iter().all(|signer| self.signatures.contains_key(signer))
    }

    pub fn missing_signers(&self) -> Vec<Address> {
        self.required_signers().iter().filter(|s| !self.signatures.contains_key(s)).copied().collect()
    }
}

#[derive(Debug, Default)]
pub struct EnvelopeBuilder {
    fee_payer: Option<Address>,
    instructions: Vec<Instruction>,
    blockhash: Option<BlockhashRef>,
}

impl EnvelopeBuilder {
    pub fn new(fee_payer: Address) -> Self {
        Self { fee_payer: Some(fee_payer), ..Default::default() }
    }

    pub fn instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn instructions(mut self, instructions: impl IntoIterator<Item = Instruction>) -> Self {
        self.instructions.extend(instructions);
        self
    }

    pub fn blockhash(mut self, blockhash: BlockhashRef) -> Self {
        self.blockhash = Some(blockhash);
        self
    }

    /// Compile against the registered compaction tables.
    ///
    /// Address ordering is deterministic: signers first (fee payer at index
    /// 0, the rest in address order), then static writable, then static
    /// read-only. Non-signer addresses present in a registered table are
    /// moved out of the static list and referenced by (table, index).
    pub fn compile(self, tables: &TableSet) -> Result<TransactionEnvelope> {
        let fee_payer = self.fee_payer.ok_or_else(|| EngineError::config("envelope requires a fee payer"))?;
        let blockhash = self.blockhash.ok_or_else(|| EngineError::config("envelope requires a blockhash"))?;
        if self.instructions.is_empty() {
            return Err(EngineError::config("envelope requires at least one instruction"));
        }

        let mut set = WorkingSet::new();
        set.insert(ResourceClaim::writable_signer(fee_payer));
        for instruction in &self.instructions {
            set.insert(ResourceClaim::read_only(instruction.program));
            set.merge_claims(&instruction.claims);
        }

        let mut signers = vec![fee_payer];
        let mut static_writable = Vec::new();
        let mut static_readonly = Vec::new();
        let mut loaded: BTreeMap<Address, (TableReference, Vec<Address>, Vec<Address>)> = BTreeMap::new();

        for claim in set.claims() {
            let access = claim.access();
            if claim.address == fee_payer {
                continue;
            }
            if access.signer {
                signers.push(claim.address);
                continue;
            }
            match tables.lookup(&claim.address) {
                Some(TableSlot { table, index }) => {
                    let entry = loaded
                        .entry(table)
                        .or_insert_with(|| (TableReference { table, ..Default::default() }, Vec::new(), Vec::new()));
                    if access.writable {
                        entry.0.writable_indexes.push(index);
                        entry.1.push(claim.address);
                    } else {
                        entry.0.readonly_indexes.push(index);
                        entry.2.push(claim.address);
                    }
                }
                None if access.writable => static_writable.push(claim.address),
                None => static_readonly.push(claim.address),
            }
        }

        let header = MessageHeader {
            signer_count: signers.len() as u16,
            writable_count: static_writable.len() as u16,
            readonly_count: static_readonly.len() as u16,
        };

        let mut static_addresses = signers;
        static_addresses.extend(static_writable);
        static_addresses.extend(static_readonly);

        // Combined index space: static, then table-loaded writable, then
        // table-loaded read-only, tables in id order throughout.
        let mut index_of: BTreeMap<Address, u16> = BTreeMap::new();
        let mut next = 0u16;
        for address in &static_addresses {
            index_of.insert(*address, next);
            next += 1;
        }
        let mut table_refs = Vec::with_capacity(loaded.len());
        for (_, (_, writable_addrs, _)) in loaded.iter() {
            for address in writable_addrs {
                index_of.insert(*address, next);
                next += 1;
            }
        }
        for (_, (_, _, readonly_addrs)) in loaded.iter() {
            for address in readonly_addrs {
                index_of.insert(*address, next);
                next += 1;
            }
        }
        for (_, (reference, _, _)) in loaded.into_iter() {
            table_refs.push(reference);
        }

        let mut instructions = Vec::with_capacity(self.instructions.len());
        for instruction in self.instructions {
            let program_index = *index_of
                .get(&instruction.program)
                .ok_or_else(|| EngineError::config(format!("program {} missing from compiled space", instruction.program)))?;
            let mut resource_indexes = Vec::with_capacity(instruction.claims.len());
            for claim in &instruction.claims {
                let index = *index_of
                    .get(&claim.address)
                    .ok_or_else(|| EngineError::config(format!("resource {} missing from compiled space", claim.address)))?;
                resource_indexes.push(index);
            }
            instructions.push(CompiledInstruction { program_index, resource_indexes, payload: instruction.payload });
        }

        Ok(TransactionEnvelope {
            header,
            static_addresses,
            blockhash,
            table_refs,
            instructions,
            signatures: BTreeMap::new(),
        })
    }
}

impl TransactionEnvelope {
    /// Access mode of a static address, derived from its segment.
    pub fn static_access(&self, position: usize) -> Access {
        let signer_end = self.header.signer_count as usize;
        let writable_end = signer_end + self.header.writable_count as usize;
        if position < signer_end {
            // Fee payer and co-signers are writable in this protocol.
            Access { writable: true, signer: true }
        } else if position < writable_end {
            Access::WRITABLE
        } else {
            Access::READ_ONLY
        }
    }
}
