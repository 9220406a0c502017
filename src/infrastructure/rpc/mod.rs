use crate::domain::command::{CommandDescriptor, StepReport};
use crate::domain::event::EventFrame;
use crate::domain::receipt::{ExecutionReceipt, InvocationRecord};
use crate::domain::resource::ResourceClaim;
use crate::domain::tables::CompactionTable;
use crate::domain::TransactionEnvelope;
use crate::foundation::{Address, BlockhashRef, EngineError, Result, TransactionId};
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// What the remote declares for the upcoming step: the command it will
/// execute, its sequence index, and the resources the step touches.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StepPlan {
    pub command: CommandDescriptor,
    pub sequence: u64,
    pub claims: Vec<ResourceClaim>,
}

impl StepPlan {
    pub fn idle() -> Self {
        Self { command: CommandDescriptor::Idle, sequence: 0, claims: Vec::new() }
    }
}

/// Outcome of waiting for a submitted envelope.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfirmationStatus {
    /// The envelope landed; a receipt is available.
    Committed,
    /// The node reports the envelope left the pipeline without landing.
    Dropped,
    /// The validity window closed before a confirmation was observed.
    /// Ambiguous: the envelope may still have landed.
    Expired,
}

#[async_trait]
pub trait ProgramRpc: Send + Sync {
    async fn latest_blockhash(&self) -> Result<BlockhashRef>;
    async fn current_height(&self) -> Result<u64>;
    async fn submit_envelope(&self, envelope: &TransactionEnvelope) -> Result<TransactionId>;
    async fn await_confirmation(&self, id: &TransactionId, expiry_height: u64) -> Result<ConfirmationStatus>;
    async fn fetch_receipt(&self, id: &TransactionId) -> Result<ExecutionReceipt>;
    /// Plan the next step. A reset descriptor (first step of a run only)
    /// makes the remote declare claims for that command instead of the one
    /// it has queued.
    async fn plan_step(&self, reset: Option<&CommandDescriptor>) -> Result<StepPlan>;
    async fn fetch_reference_table(&self, table: &Address) -> Result<CompactionTable>;
}

/// Scripted in-memory node for tests and offline use.
///
/// Plans, step reports, confirmations and failures are queues the test
/// pushes; every trait call is counted so callers can assert on I/O.
pub struct ScriptedRpc {
    blockhash: Mutex<BlockhashRef>,
    height: AtomicU64,
    plans: Mutex<VecDeque<StepPlan>>,
    reports: Mutex<VecDeque<StepReport>>,
    receipts: Mutex<VecDeque<ExecutionReceipt>>,
    confirmations: Mutex<VecDeque<ConfirmationStatus>>,
    submit_failures: Mutex<VecDeque<EngineError>>,
    pending_receipts: Mutex<BTreeMap<TransactionId, ExecutionReceipt>>,
    submitted: Mutex<Vec<TransactionEnvelope>>,
    tables: Mutex<BTreeMap<Address, CompactionTable>>,
    route_via_invocations: AtomicBool,
    authority: Mutex<Address>,
    network_calls: AtomicU64,
}

impl ScriptedRpc {
    pub fn new() -> Self {
        Self {
            blockhash: Mutex::new(BlockhashRef { hash: [0xAA; 32].into(), expiry_height: 100 }),
            height: AtomicU64::new(1),
            plans: Mutex::new(VecDeque::new()),
            reports: Mutex::new(VecDeque::new()),
            receipts: Mutex::new(VecDeque::new()),
            confirmations: Mutex::new(VecDeque::new()),
            submit_failures: Mutex::new(VecDeque::new()),
            pending_receipts: Mutex::new(BTreeMap::new()),
            submitted: Mutex::new(Vec::new()),
            tables: Mutex::new(BTreeMap::new()),
            route_via_invocations: AtomicBool::new(true),
            authority: Mutex::new(Address::default()),
            network_calls: AtomicU64::new(0),
        }
    }

    fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<std::sync::MutexGuard<'a, T>> {
        mutex.lock().map_err(|_| EngineError::rpc(what.to_string(), "poisoned lock"))
    }

    pub fn set_blockhash(&self, blockhash: BlockhashRef) {
        if let Ok(mut slot) = self.blockhash.lock() {
            *slot = blockhash;
        }
    }

    pub fn set_height(&self, height: u64) {
        self.height.store(height, Ordering::Relaxed);
    }

    /// Authority used when routing step events through invocation records.
    pub fn set_authority(&self, authority: Address) {
        if let Ok(mut slot) = self.authority.lock() {
            *slot = authority;
        }
    }

    /// When false, step events are embedded in log lines instead of
    /// invocation records.
    pub fn route_events_via_invocations(&self, enabled: bool) {
        self.route_via_invocations.store(enabled, Ordering::Relaxed);
    }

    pub fn push_plan(&self, plan: StepPlan) {
        if let Ok(mut plans) = self.plans.lock() {
            plans.push_back(plan);
        }
    }

    pub fn push_report(&self, report: StepReport) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push_back(report);
        }
    }

    pub fn push_receipt(&self, receipt: ExecutionReceipt) {
        if let Ok(mut receipts) = self.receipts.lock() {
            receipts.push_back(receipt);
        }
    }

    pub fn push_confirmation(&self, status: ConfirmationStatus) {
        if let Ok(mut confirmations) = self.confirmations.lock() {
            confirmations.push_back(status);
        }
    }

    pub fn push_submit_failure(&self, error: EngineError) {
        if let Ok(mut failures) = self.submit_failures.lock() {
            failures.push_back(error);
        }
    }

    pub fn set_table(&self, id: Address, table: CompactionTable) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.insert(id, table);
        }
    }

    pub fn submitted_envelopes(&self) -> Vec<TransactionEnvelope> {
        self.submitted.lock().map(|envelopes| envelopes.clone()).unwrap_or_default()
    }

    pub fn submission_count(&self) -> usize {
        self.submitted.lock().map(|envelopes| envelopes.len()).unwrap_or(0)
    }

    /// Total trait calls made against this node.
    pub fn network_call_count(&self) -> u64 {
        self.network_calls.load(Ordering::Relaxed)
    }

    fn count_call(&self) {
        self.network_calls.fetch_add(1, Ordering::Relaxed);
    }

    fn receipt_for_report(&self, report: &StepReport) -> Result<ExecutionReceipt> {
        let frame = EventFrame::new(
            crate::domain::command::STEP_EVENT,
            borsh::to_vec(report)
                .map_err(|err| EngineError::Serialization { format: "borsh".to_string(), details: err.to_string() })?,
        );
        if self.route_via_invocations.load(Ordering::Relaxed) {
            let authority = *Self::lock(&self.authority, "authority")?;
            Ok(ExecutionReceipt::success(
                vec!["controller: invoke".to_string(), "controller: step applied".to_string()],
                vec![InvocationRecord { program: authority, data: frame.to_invocation_data()? }],
            ))
        } else {
            Ok(ExecutionReceipt::success(vec![frame.to_log_line()?], Vec::new()))
        }
    }
}

impl Default for ScriptedRpc {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgramRpc for ScriptedRpc {
    async fn latest_blockhash(&self) -> Result<BlockhashRef> {
        self.count_call();
        Ok(*Self::lock(&self.blockhash, "latest_blockhash")?)
    }

    async fn current_height(&self) -> Result<u64> {
        self.count_call();
        Ok(self.height.load(Ordering::Relaxed))
    }

    async fn submit_envelope(&self, envelope: &TransactionEnvelope) -> Result<TransactionId> {
        self.count_call();
        if let Some(error) = Self::lock(&self.submit_failures, "submit_envelope")?.pop_front() {
            return Err(error);
        }

        let id = TransactionId::new(envelope.signing_digest()?);
        let receipt = if let Some(receipt) = Self::lock(&self.receipts, "submit_envelope")?.pop_front() {
            receipt
        } else if let Some(report) = Self::lock(&self.reports, "submit_envelope")?.pop_front() {
            self.receipt_for_report(&report)?
        } else {
            ExecutionReceipt::success(vec!["controller: no-op".to_string()], Vec::new())
        };
        Self::lock(&self.pending_receipts, "submit_envelope")?.insert(id, receipt);
        Self::lock(&self.submitted, "submit_envelope")?.push(envelope.clone());
        Ok(id)
    }

    async fn await_confirmation(&self, _id: &TransactionId, _expiry_height: u64) -> Result<ConfirmationStatus> {
        self.count_call();
        Ok(Self::lock(&self.confirmations, "await_confirmation")?.pop_front().unwrap_or(ConfirmationStatus::Committed))
    }

    async fn fetch_receipt(&self, id: &TransactionId) -> Result<ExecutionReceipt> {
        self.count_call();
        Self::lock(&self.pending_receipts, "fetch_receipt")?
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::rpc("fetch_receipt", format!("no receipt for {id}")))
    }

    async fn plan_step(&self, reset: Option<&CommandDescriptor>) -> Result<StepPlan> {
        self.count_call();
        let mut plan = Self::lock(&self.plans, "plan_step")?.pop_front().unwrap_or_else(StepPlan::idle);
        if let Some(command) = reset {
            plan.command = command.clone();
        }
        Ok(plan)
    }

    async fn fetch_reference_table(&self, table: &Address) -> Result<CompactionTable> {
        self.count_call();
        Self::lock(&self.tables, "fetch_reference_table")?
            .get(table)
            .cloned()
            .ok_or_else(|| EngineError::rpc("fetch_reference_table", format!("unknown table {table}")))
    }
}
