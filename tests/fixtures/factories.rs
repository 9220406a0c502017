//! Factories for the scripted engine harness.

use crate::fixtures::constants::{FEE_PAYER, FEE_PAYER_SEED};
use crank_core::application::driver::RunSpec;
use crank_core::application::{CommandLoopDriver, TransactionOrchestrator};
use crank_core::domain::command::{CommandDescriptor, CommandOutcome, StepReport};
use crank_core::domain::resource::ResourceClaim;
use crank_core::domain::ControllerProfile;
use crank_core::foundation::Address;
use crank_core::infrastructure::rpc::{ScriptedRpc, StepPlan};
use crank_core::infrastructure::signing::{LocalSigner, SignerRegistry};
use std::sync::Arc;

pub fn addr(byte: u8) -> Address {
    Address::new([byte; 32])
}

pub fn profile() -> ControllerProfile {
    ControllerProfile {
        program_id: addr(0xA1),
        authority: addr(0xA2),
        system_resource: addr(0xA3),
        table_program: addr(0xA4),
        receipt_tokens: vec![addr(0xA5)],
        pricing_sources: vec![addr(0xA6), addr(0xA7)],
    }
}

pub fn registry() -> SignerRegistry {
    SignerRegistry::new().with(FEE_PAYER, Arc::new(LocalSigner::from_secret_bytes(FEE_PAYER_SEED)))
}

pub struct Harness {
    pub rpc: Arc<ScriptedRpc>,
    pub orchestrator: Arc<TransactionOrchestrator>,
    pub driver: CommandLoopDriver,
    pub profile: ControllerProfile,
}

pub fn harness() -> Harness {
    harness_with_registry(registry())
}

pub fn harness_with_registry(registry: SignerRegistry) -> Harness {
    let rpc = Arc::new(ScriptedRpc::new());
    let profile = profile();
    rpc.set_authority(profile.authority);
    let orchestrator = Arc::new(TransactionOrchestrator::new(rpc.clone(), Arc::new(registry), profile.authority));
    let driver = CommandLoopDriver::new(rpc.clone(), orchestrator.clone(), profile.clone());
    Harness { rpc, orchestrator, driver, profile }
}

pub fn run_spec(iteration_cap: u32) -> RunSpec {
    RunSpec { reset: None, signer: FEE_PAYER.to_string(), iteration_cap, budget: None }
}

/// Script `total` settle steps counting the sequence down to zero. Step `i`
/// runs against sequence `total - i` and declares one writable claim of its
/// own.
pub fn script_countdown(rpc: &ScriptedRpc, total: u64) {
    for i in 0..total {
        let remaining = total - i;
        rpc.push_plan(StepPlan {
            command: CommandDescriptor::SettleBatch { batch: i as u32 },
            sequence: remaining,
            claims: vec![ResourceClaim::writable(addr(0xB0 + i as u8))],
        });
        rpc.push_report(StepReport {
            executed: CommandDescriptor::SettleBatch { batch: i as u32 },
            outcome: Some(CommandOutcome::SettleBatch { settled: 1, remaining: (remaining - 1) as u32 }),
            next_sequence: remaining - 1,
        });
    }
}

// LCG parameters from Numerical Recipes; fine for deterministic test coverage.
pub fn next_u64(state: &mut u64) -> u64 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    *state
}

pub fn shuffle<T>(items: &mut [T], state: &mut u64) {
    for i in (1..items.len()).rev() {
        let j = (next_u64(state) % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}
