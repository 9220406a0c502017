use crate::fixtures::{harness, run_spec, FEE_PAYER};
use crank_core::application::TableSession;
use crank_core::domain::command::CommandDescriptor;
use crank_core::domain::resource::ResourceClaim;
use crank_core::domain::tables::CompactionTable;
use crank_core::foundation::constants::RESOURCE_CEILING;
use crank_core::foundation::{Address, ErrorCode};
use crank_core::infrastructure::rpc::StepPlan;

fn table_id(byte: u8) -> Address {
    Address::new([byte; 32])
}

fn candidate(i: usize) -> Address {
    let mut bytes = [0u8; 32];
    bytes[0] = 0xF0;
    bytes[1] = (i / 256) as u8;
    bytes[2] = (i % 256) as u8;
    Address::new(bytes)
}

#[tokio::test]
async fn fifty_new_addresses_extend_in_two_chunks() {
    let h = harness();
    h.rpc.set_table(table_id(1), CompactionTable { addresses: Vec::new(), capacity: 64 });

    let mut session = TableSession::new(h.rpc.clone());
    session.register_active(&[table_id(1)]).await.expect("register");

    let candidates: Vec<Address> = (0..50).map(candidate).collect();
    let calls = session
        .extend(&h.orchestrator, &h.profile, FEE_PAYER, table_id(1), &candidates)
        .await
        .expect("extend");

    assert_eq!(calls, 2);
    assert_eq!(h.rpc.submission_count(), 2);

    let envelopes = h.rpc.submitted_envelopes();
    // First chunk fills the call to the ceiling: 27 candidates + 5 overhead.
    assert_eq!(envelopes[0].resource_count(), RESOURCE_CEILING);
    assert_eq!(envelopes[1].resource_count(), 23 + 5);
}

#[tokio::test]
async fn extend_with_no_candidates_issues_zero_calls() {
    let h = harness();
    h.rpc.set_table(table_id(1), CompactionTable { addresses: Vec::new(), capacity: 16 });

    let mut session = TableSession::new(h.rpc.clone());
    session.register_active(&[table_id(1)]).await.expect("register");

    let calls =
        session.extend(&h.orchestrator, &h.profile, FEE_PAYER, table_id(1), &[]).await.expect("extend");
    assert_eq!(calls, 0);
    assert_eq!(h.rpc.submission_count(), 0);
}

#[tokio::test]
async fn already_present_candidates_issue_zero_calls() {
    let h = harness();
    let existing: Vec<Address> = (0..4).map(candidate).collect();
    h.rpc.set_table(table_id(1), CompactionTable { addresses: existing.clone(), capacity: 16 });

    let mut session = TableSession::new(h.rpc.clone());
    session.register_active(&[table_id(1)]).await.expect("register");

    let calls = session
        .extend(&h.orchestrator, &h.profile, FEE_PAYER, table_id(1), &existing)
        .await
        .expect("extend");
    assert_eq!(calls, 0);
    assert_eq!(h.rpc.submission_count(), 0);
}

#[tokio::test]
async fn duplicate_candidates_count_once() {
    let h = harness();
    h.rpc.set_table(table_id(1), CompactionTable { addresses: Vec::new(), capacity: 16 });

    let mut session = TableSession::new(h.rpc.clone());
    session.register_active(&[table_id(1)]).await.expect("register");

    let candidates = vec![candidate(0), candidate(0), candidate(1)];
    let calls = session
        .extend(&h.orchestrator, &h.profile, FEE_PAYER, table_id(1), &candidates)
        .await
        .expect("extend");
    assert_eq!(calls, 1);
}

#[tokio::test]
async fn capacity_overflow_is_rejected_before_any_call() {
    let h = harness();
    h.rpc.set_table(table_id(1), CompactionTable { addresses: Vec::new(), capacity: 10 });

    let mut session = TableSession::new(h.rpc.clone());
    session.register_active(&[table_id(1)]).await.expect("register");

    let candidates: Vec<Address> = (0..11).map(candidate).collect();
    let err = session
        .extend(&h.orchestrator, &h.profile, FEE_PAYER, table_id(1), &candidates)
        .await
        .expect_err("must fail");
    assert_eq!(err.code(), ErrorCode::ConfigError);
    assert_eq!(h.rpc.submission_count(), 0);
}

#[tokio::test]
async fn re_registration_replaces_the_set_wholesale() {
    let h = harness();
    h.rpc.set_table(table_id(1), CompactionTable { addresses: vec![candidate(1)], capacity: 8 });
    h.rpc.set_table(table_id(2), CompactionTable { addresses: vec![candidate(2)], capacity: 8 });

    let mut session = TableSession::new(h.rpc.clone());
    session.register_active(&[table_id(1)]).await.expect("register");
    assert!(session.set().get(&table_id(1)).is_some());

    session.register_active(&[table_id(2)]).await.expect("re-register");
    assert!(session.set().get(&table_id(1)).is_none());
    assert!(session.set().get(&table_id(2)).is_some());

    session.invalidate();
    assert!(session.set().is_empty());
}

#[tokio::test]
async fn registered_tables_compact_advance_envelopes() {
    let h = harness();
    let step_resource = candidate(7);
    h.rpc.set_table(table_id(1), CompactionTable { addresses: vec![step_resource], capacity: 8 });

    let mut session = TableSession::new(h.rpc.clone());
    session.register_active(&[table_id(1)]).await.expect("register");

    h.rpc.push_plan(StepPlan {
        command: CommandDescriptor::CollectResidue,
        sequence: 1,
        claims: vec![ResourceClaim::read_only(step_resource)],
    });
    h.rpc.push_report(crank_core::domain::command::StepReport {
        executed: CommandDescriptor::CollectResidue,
        outcome: None,
        next_sequence: 0,
    });

    let outcome = h.driver.drive(run_spec(3), session.set()).await.expect("drive");
    assert!(outcome.terminal);

    let envelope = &h.rpc.submitted_envelopes()[0];
    assert_eq!(envelope.table_refs().len(), 1);
    assert!(!envelope.static_addresses().contains(&step_resource));
}
