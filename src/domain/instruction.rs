//! Instructions and resource-budget directives.

use crate::foundation::constants::OP_TAG_LEN;
use crate::foundation::{Address, EngineError, Result};
use crate::domain::resource::ResourceClaim;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Leading payload tag for a named operation.
pub fn op_tag(name: &str) -> [u8; OP_TAG_LEN] {
    let digest = blake3::hash(name.as_bytes());
    let mut tag = [0u8; OP_TAG_LEN];
    tag.copy_from_slice(&digest.as_bytes()[..OP_TAG_LEN]);
    tag
}

/// Well-known address accepting budget directives.
pub fn budget_program() -> Address {
    Address::new(*blake3::hash(b"crank/budget-program").as_bytes())
}

/// One opaque operation: target program, declared resources, tagged payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instruction {
    pub program: Address,
    pub claims: Vec<ResourceClaim>,
    pub payload: Vec<u8>,
}

impl Instruction {
    /// Build an instruction whose payload is the operation tag followed by
    /// the borsh encoding of `args`.
    pub fn tagged<T: BorshSerialize>(program: Address, op: &str, args: &T, claims: Vec<ResourceClaim>) -> Result<Self> {
        let mut payload = op_tag(op).to_vec();
        let encoded = borsh::to_vec(args)
            .map_err(|err| EngineError::Serialization { format: "borsh".to_string(), details: err.to_string() })?;
        payload.extend_from_slice(&encoded);
        Ok(Self { program, claims, payload })
    }

    pub fn has_op(&self, op: &str) -> bool {
        self.payload.len() >= OP_TAG_LEN && self.payload[..OP_TAG_LEN] == op_tag(op)
    }
}

/// Optional per-call resource budget. Directives are prepended to the
/// envelope in a fixed order: scratch memory, unit price, unit limit.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct ResourceBudget {
    pub scratch_bytes: Option<u32>,
    pub unit_price_micro: Option<u64>,
    pub unit_limit: Option<u32>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, BorshDeserialize, BorshSerialize)]
pub enum BudgetDirective {
    ScratchMemory { bytes: u32 },
    UnitPrice { micro_units: u64 },
    UnitLimit { units: u32 },
}

impl ResourceBudget {
    pub fn directives(&self) -> Vec<BudgetDirective> {
        let mut out = Vec::new();
        if let Some(bytes) = self.scratch_bytes {
            out.push(BudgetDirective::ScratchMemory { bytes });
        }
        if let Some(micro_units) = self.unit_price_micro {
            out.push(BudgetDirective::UnitPrice { micro_units });
        }
        if let Some(units) = self.unit_limit {
            out.push(BudgetDirective::UnitLimit { units });
        }
        out
    }

    /// Budget pseudo-instructions, in submission order. Each is optional;
    /// none declare resources of their own.
    pub fn instructions(&self) -> Result<Vec<Instruction>> {
        self.directives()
            .into_iter()
            .map(|directive| {
                let op = match directive {
                    BudgetDirective::ScratchMemory { .. } => "request_scratch_memory",
                    BudgetDirective::UnitPrice { .. } => "set_unit_price",
                    BudgetDirective::UnitLimit { .. } => "set_unit_limit",
                };
                Instruction::tagged(budget_program(), op, &directive, Vec::new())
            })
            .collect()
    }
}
