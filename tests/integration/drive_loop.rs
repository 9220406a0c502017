use crate::fixtures::{addr, harness, run_spec, script_countdown};
use crank_core::domain::command::{CommandDescriptor, CommandOutcome, StepReport};
use crank_core::domain::instruction::op_tag;
use crank_core::domain::receipt::ExecutionReceipt;
use crank_core::domain::resource::ResourceClaim;
use crank_core::domain::tables::TableSet;
use crank_core::domain::ADVANCE_OP;
use crank_core::foundation::constants::{OP_TAG_LEN, RESOURCE_CEILING};
use crank_core::foundation::{EngineError, ErrorCode};
use crank_core::infrastructure::rpc::StepPlan;

#[tokio::test]
async fn countdown_run_reaches_terminal_state() {
    let h = harness();
    script_countdown(&h.rpc, 3);

    let outcome = h.driver.drive(run_spec(10), &TableSet::default()).await.expect("drive");
    assert!(outcome.terminal);
    assert_eq!(outcome.steps.len(), 3);
    assert_eq!(h.rpc.submission_count(), 3);

    let befores: Vec<u64> = outcome.steps.iter().map(|s| s.sequence_before).collect();
    let afters: Vec<u64> = outcome.steps.iter().map(|s| s.sequence_after).collect();
    assert_eq!(befores, vec![3, 2, 1]);
    assert_eq!(afters, vec![2, 1, 0]);
    assert_eq!(outcome.final_report().expect("final").next_sequence, 0);
}

#[tokio::test]
async fn cap_of_one_returns_non_terminal_without_error() {
    let h = harness();
    script_countdown(&h.rpc, 5);

    let outcome = h.driver.drive(run_spec(1), &TableSet::default()).await.expect("drive");
    assert!(!outcome.terminal);
    assert_eq!(outcome.steps.len(), 1);
    assert_eq!(h.rpc.submission_count(), 1);
}

#[tokio::test]
async fn iteration_cap_bounds_orchestrated_calls() {
    let h = harness();
    script_countdown(&h.rpc, 10);

    let outcome = h.driver.drive(run_spec(4), &TableSet::default()).await.expect("drive");
    assert!(!outcome.terminal);
    assert_eq!(outcome.steps.len(), 4);
    assert_eq!(h.rpc.submission_count(), 4);
}

#[tokio::test]
async fn interrupted_run_resumes_to_the_same_terminal_state() {
    // Reference: the same five steps driven without interruption.
    let reference = harness();
    script_countdown(&reference.rpc, 5);
    let uninterrupted = reference.driver.drive(run_spec(10), &TableSet::default()).await.expect("drive");
    assert!(uninterrupted.terminal);

    // Interrupted at the cap after two steps, then resumed with no reset.
    let h = harness();
    script_countdown(&h.rpc, 5);
    let first = h.driver.drive(run_spec(2), &TableSet::default()).await.expect("first leg");
    assert!(!first.terminal);
    assert_eq!(first.steps.len(), 2);

    let second = h.driver.drive(run_spec(10), &TableSet::default()).await.expect("second leg");
    assert!(second.terminal);
    assert_eq!(second.steps.len(), 3);

    let resumed: Vec<&StepReport> =
        first.steps.iter().chain(second.steps.iter()).map(|step| &step.report).collect();
    let baseline: Vec<&StepReport> = uninterrupted.steps.iter().map(|step| &step.report).collect();
    assert_eq!(resumed, baseline);
}

#[tokio::test]
async fn idle_remote_is_terminal_with_zero_calls() {
    let h = harness();
    // No plans scripted: the remote reports an idle state.
    let outcome = h.driver.drive(run_spec(5), &TableSet::default()).await.expect("drive");
    assert!(outcome.terminal);
    assert!(outcome.steps.is_empty());
    assert_eq!(h.rpc.submission_count(), 0);
}

#[tokio::test]
async fn reset_command_shapes_the_first_step_only() {
    let h = harness();
    let reset = CommandDescriptor::RefreshPricing { stale_height: 7 };
    h.rpc.push_plan(StepPlan {
        command: CommandDescriptor::Idle,
        sequence: 2,
        claims: vec![ResourceClaim::writable(addr(0xC1))],
    });
    h.rpc.push_report(StepReport {
        executed: reset.clone(),
        outcome: Some(CommandOutcome::RefreshPricing { updated_sources: 2 }),
        next_sequence: 1,
    });
    script_countdown(&h.rpc, 1);

    let mut spec = run_spec(10);
    spec.reset = Some(reset.clone());
    let outcome = h.driver.drive(spec, &TableSet::default()).await.expect("drive");

    assert!(outcome.terminal);
    assert_eq!(outcome.steps.len(), 2);
    assert_eq!(outcome.steps[0].reset.as_ref(), Some(&reset));
    assert_eq!(outcome.steps[0].sequence_before, 0); // pre-state of a reset step
    assert_eq!(outcome.steps[0].report.executed, reset);
    assert!(outcome.steps[1].reset.is_none());

    let advance = &h.rpc.submitted_envelopes()[0].instructions()[0];
    assert_eq!(advance.payload[..OP_TAG_LEN], op_tag(ADVANCE_OP));
}

#[tokio::test]
async fn unknown_signer_fails_before_any_network_io() {
    let h = harness();
    script_countdown(&h.rpc, 2);

    let mut spec = run_spec(5);
    spec.signer = "ghost".to_string();
    let err = h.driver.drive(spec, &TableSet::default()).await.expect_err("must fail");
    assert!(matches!(err, EngineError::UnknownSigner { ref name } if name == "ghost"));
    assert_eq!(h.rpc.network_call_count(), 0);
}

#[tokio::test]
async fn oversized_working_set_fails_before_submission() {
    let h = harness();
    let claims: Vec<ResourceClaim> =
        (0..RESOURCE_CEILING as u8).map(|i| ResourceClaim::writable(addr(0xD0u8.wrapping_add(i)))).collect();
    h.rpc.push_plan(StepPlan { command: CommandDescriptor::CollectResidue, sequence: 1, claims });

    let err = h.driver.drive(run_spec(3), &TableSet::default()).await.expect_err("must overflow");
    assert_eq!(err.code(), ErrorCode::WorkingSetOverflow);
    assert_eq!(h.rpc.submission_count(), 0);
}

#[tokio::test]
async fn confirmed_step_without_report_is_receipt_malformed() {
    let h = harness();
    h.rpc.push_plan(StepPlan { command: CommandDescriptor::CollectResidue, sequence: 1, claims: Vec::new() });
    h.rpc.push_receipt(ExecutionReceipt::success(vec!["controller: silent".to_string()], Vec::new()));

    let err = h.driver.drive(run_spec(1), &TableSet::default()).await.expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::ReceiptMalformed);
}

#[tokio::test]
async fn mismatched_outcome_tag_is_receipt_malformed() {
    let h = harness();
    h.rpc.push_plan(StepPlan { command: CommandDescriptor::SettleBatch { batch: 0 }, sequence: 2, claims: Vec::new() });
    h.rpc.push_report(StepReport {
        executed: CommandDescriptor::SettleBatch { batch: 0 },
        outcome: Some(CommandOutcome::CollectResidue { reclaimed: 3 }),
        next_sequence: 1,
    });

    let err = h.driver.drive(run_spec(3), &TableSet::default()).await.expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::ReceiptMalformed);
    assert_eq!(h.rpc.submission_count(), 1);
}

#[tokio::test]
async fn orchestrator_errors_abort_the_run_unchanged() {
    let h = harness();
    script_countdown(&h.rpc, 4);
    h.rpc.push_submit_failure(EngineError::submission("node refused"));

    let err = h.driver.drive(run_spec(10), &TableSet::default()).await.expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::SubmissionRejected);
    // Nothing landed; the remote's committed sequence is untouched.
    assert_eq!(h.rpc.submission_count(), 0);
}
