//! The command loop: one advance call per step until the remote reports
//! idle or the iteration cap is reached.

use crate::application::orchestrator::{CallRequest, TransactionOrchestrator};
use crate::domain::command::{AdvanceArgs, CommandDescriptor, StepReport, ADVANCE_OP, STEP_EVENT};
use crate::domain::instruction::{Instruction, ResourceBudget};
use crate::domain::tables::TableSet;
use crate::domain::{ControllerProfile, WorkingSet};
use crate::foundation::{EngineError, Result};
use crate::infrastructure::rpc::ProgramRpc;
use log::{debug, info};
use std::sync::Arc;

/// Parameters of one command run.
#[derive(Clone, Debug)]
pub struct RunSpec {
    /// Replaces the remote's queued command on the first step only.
    pub reset: Option<CommandDescriptor>,
    /// Fee-payer signer name for every step.
    pub signer: String,
    /// Hard bound on orchestrated calls.
    pub iteration_cap: u32,
    pub budget: Option<ResourceBudget>,
}

/// One executed step of a run.
#[derive(Clone, Debug)]
pub struct CommandStep {
    /// Reset command used for this step; first step only.
    pub reset: Option<CommandDescriptor>,
    pub sequence_before: u64,
    pub sequence_after: u64,
    pub report: StepReport,
}

/// Result of a run. `terminal` is true only when the remote reported a zero
/// sequence; exhausting the cap is reported, never treated as success.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub steps: Vec<CommandStep>,
    pub terminal: bool,
}

impl RunOutcome {
    pub fn final_report(&self) -> Option<&StepReport> {
        self.steps.last().map(|step| &step.report)
    }
}

/// Drives the remote state machine to completion.
///
/// Carries no retry or backoff: any orchestrator error aborts the run
/// unchanged. The remote's last committed sequence is unaffected by a failed
/// attempt, so re-driving later (without a reset) resumes safely.
pub struct CommandLoopDriver {
    rpc: Arc<dyn ProgramRpc>,
    orchestrator: Arc<TransactionOrchestrator>,
    profile: ControllerProfile,
}

impl CommandLoopDriver {
    pub fn new(rpc: Arc<dyn ProgramRpc>, orchestrator: Arc<TransactionOrchestrator>, profile: ControllerProfile) -> Self {
        Self { rpc, orchestrator, profile }
    }

    pub async fn drive(&self, spec: RunSpec, tables: &TableSet) -> Result<RunOutcome> {
        // Resolves before any I/O; an unknown signer never reaches the network.
        let fee_payer = self.orchestrator.signer_public_key(&spec.signer)?;
        let mut steps = Vec::new();

        for iteration in 0..spec.iteration_cap {
            let reset = if iteration == 0 { spec.reset.as_ref() } else { None };
            let plan = self.rpc.plan_step(reset).await?;

            if reset.is_none() && plan.sequence == 0 {
                info!("remote reports idle, run terminal after {} steps", steps.len());
                return Ok(RunOutcome { steps, terminal: true });
            }
            let sequence_before = if reset.is_some() { 0 } else { plan.sequence };

            let mut working_set = WorkingSet::from_claims(&self.profile.core_claims(fee_payer));
            working_set.merge_claims(&plan.claims);
            working_set.ensure_within_ceiling()?;
            debug!(
                "step planned iteration={} command={} sequence={} resources={}",
                iteration,
                plan.command.tag(),
                sequence_before,
                working_set.len()
            );

            let advance = Instruction::tagged(
                self.profile.program_id,
                ADVANCE_OP,
                &AdvanceArgs { reset: reset.cloned() },
                working_set.claims(),
            )?;
            let request = CallRequest {
                instructions: vec![advance],
                signer_names: vec![spec.signer.clone()],
                budget: spec.budget,
                requested_events: vec![STEP_EVENT.to_string()],
            };

            let outcome = self.orchestrator.execute(request, tables).await?;
            let frame = outcome
                .events
                .get(STEP_EVENT)
                .ok_or_else(|| EngineError::receipt_malformed(format!("confirmed advance {} carried no step report", outcome.transaction_id)))?;
            let report: StepReport = frame
                .payload_as()
                .map_err(|err| EngineError::receipt_malformed(format!("step report undecodable: {err}")))?;
            if !report.outcome_matches_executed() {
                return Err(EngineError::receipt_malformed(format!(
                    "step outcome tag does not match executed command {}",
                    report.executed.tag()
                )));
            }

            info!(
                "command step executed iteration={} command={} outcome={:?} next_sequence={}",
                iteration,
                report.executed.tag(),
                report.outcome,
                report.next_sequence
            );
            let next_sequence = report.next_sequence;
            steps.push(CommandStep { reset: reset.cloned(), sequence_before, sequence_after: next_sequence, report });

            if next_sequence == 0 {
                return Ok(RunOutcome { steps, terminal: true });
            }
        }

        info!("iteration cap {} reached with nonzero sequence, run non-terminal", spec.iteration_cap);
        Ok(RunOutcome { steps, terminal: false })
    }
}
