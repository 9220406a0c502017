use crate::fixtures::addr;
use crank_core::domain::instruction::{op_tag, Instruction};
use crank_core::domain::resource::ResourceClaim;
use crank_core::domain::tables::{CompactionTable, TableSet};
use crank_core::domain::EnvelopeBuilder;
use crank_core::foundation::constants::OP_TAG_LEN;
use crank_core::foundation::{Blockhash, BlockhashRef};
use std::collections::BTreeMap;

fn blockhash() -> BlockhashRef {
    BlockhashRef { hash: Blockhash::new([0x11; 32]), expiry_height: 99 }
}

#[test]
fn fee_payer_claimed_by_instruction_is_not_duplicated() {
    let instruction = Instruction {
        program: addr(5),
        claims: vec![ResourceClaim::writable_signer(addr(1)), ResourceClaim::writable(addr(2))],
        payload: vec![0],
    };
    let envelope = EnvelopeBuilder::new(addr(1))
        .instruction(instruction)
        .blockhash(blockhash())
        .compile(&TableSet::default())
        .expect("compile");

    assert_eq!(envelope.static_addresses().iter().filter(|a| **a == addr(1)).count(), 1);
    assert_eq!(envelope.required_signers(), &[addr(1)]);
}

#[test]
fn compiled_indexes_cover_loaded_addresses() {
    let mut tables = BTreeMap::new();
    tables.insert(addr(9), CompactionTable { addresses: vec![addr(2), addr(3)], capacity: 4 });
    let tables = TableSet::new(tables);

    let instruction = Instruction {
        program: addr(5),
        claims: vec![ResourceClaim::writable(addr(2)), ResourceClaim::read_only(addr(3))],
        payload: op_tag("noop").to_vec(),
    };
    let envelope = EnvelopeBuilder::new(addr(1))
        .instruction(instruction)
        .blockhash(blockhash())
        .compile(&tables)
        .expect("compile");

    // Static space: fee payer + program. Loaded space follows it.
    assert_eq!(envelope.static_addresses().len(), 2);
    let compiled = &envelope.instructions()[0];
    let static_len = envelope.static_addresses().len() as u16;
    assert!(compiled.resource_indexes.iter().all(|index| *index >= static_len));
    assert_eq!(compiled.resource_indexes.len(), 2);
    assert_ne!(compiled.resource_indexes[0], compiled.resource_indexes[1]);
    assert_eq!(compiled.payload[..OP_TAG_LEN], op_tag("noop"));
}

#[test]
fn digest_is_stable_for_identical_envelopes() {
    let build = || {
        EnvelopeBuilder::new(addr(1))
            .instruction(Instruction { program: addr(5), claims: vec![ResourceClaim::writable(addr(2))], payload: vec![7] })
            .blockhash(blockhash())
            .compile(&TableSet::default())
            .expect("compile")
    };
    assert_eq!(build().signing_digest().expect("digest"), build().signing_digest().expect("digest"));
}
