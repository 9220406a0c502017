//! The remote state machine's command vocabulary.
//!
//! Both sides of the wire contract are closed sums: the descriptor names the
//! unit of progress the remote will execute next, the outcome reports what a
//! finished step produced. Decode sites match exhaustively; an outcome whose
//! tag does not match its descriptor is a protocol violation.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Name of the single event an advance call is asked to report.
pub const STEP_EVENT: &str = "command_step";

/// Operation name of the advance instruction.
pub const ADVANCE_OP: &str = "advance_command";

#[derive(Clone, Debug, Eq, PartialEq, BorshDeserialize, BorshSerialize, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CommandDescriptor {
    /// Remote has no queued work.
    Idle,
    /// Re-read the pricing sources and refresh cached rates.
    RefreshPricing { stale_height: u64 },
    /// Settle one batch of pending obligations.
    SettleBatch { batch: u32 },
    /// Pay out one shard of accrued yield.
    DistributeYield { shard: u32 },
    /// Sweep residue left behind by earlier settlements.
    CollectResidue,
}

impl CommandDescriptor {
    pub fn tag(&self) -> &'static str {
        match self {
            CommandDescriptor::Idle => "idle",
            CommandDescriptor::RefreshPricing { .. } => "refresh_pricing",
            CommandDescriptor::SettleBatch { .. } => "settle_batch",
            CommandDescriptor::DistributeYield { .. } => "distribute_yield",
            CommandDescriptor::CollectResidue => "collect_residue",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, BorshDeserialize, BorshSerialize, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CommandOutcome {
    RefreshPricing { updated_sources: u32 },
    SettleBatch { settled: u32, remaining: u32 },
    DistributeYield { recipients: u32, amount: u64 },
    CollectResidue { reclaimed: u64 },
}

impl CommandOutcome {
    pub fn tag(&self) -> &'static str {
        match self {
            CommandOutcome::RefreshPricing { .. } => "refresh_pricing",
            CommandOutcome::SettleBatch { .. } => "settle_batch",
            CommandOutcome::DistributeYield { .. } => "distribute_yield",
            CommandOutcome::CollectResidue { .. } => "collect_residue",
        }
    }
}

/// The one event emitted per advance call.
#[derive(Clone, Debug, Eq, PartialEq, BorshDeserialize, BorshSerialize)]
pub struct StepReport {
    pub executed: CommandDescriptor,
    /// Present when the executed command produced a result payload; its tag
    /// must match `executed`.
    pub outcome: Option<CommandOutcome>,
    /// Remaining internal steps; 0 signals the remote is idle.
    pub next_sequence: u64,
}

impl StepReport {
    pub fn outcome_matches_executed(&self) -> bool {
        match (&self.executed, &self.outcome) {
            (_, None) => true,
            (CommandDescriptor::Idle, Some(_)) => false,
            (CommandDescriptor::RefreshPricing { .. }, Some(CommandOutcome::RefreshPricing { .. })) => true,
            (CommandDescriptor::SettleBatch { .. }, Some(CommandOutcome::SettleBatch { .. })) => true,
            (CommandDescriptor::DistributeYield { .. }, Some(CommandOutcome::DistributeYield { .. })) => true,
            (CommandDescriptor::CollectResidue, Some(CommandOutcome::CollectResidue { .. })) => true,
            (_, Some(_)) => false,
        }
    }
}

/// Arguments of the advance instruction. The reset command is only ever
/// present on the first step of a run.
#[derive(Clone, Debug, Eq, PartialEq, BorshDeserialize, BorshSerialize)]
pub struct AdvanceArgs {
    pub reset: Option<CommandDescriptor>,
}
