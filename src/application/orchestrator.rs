//! One atomic call: build, sign, submit, confirm, decode.

use crate::application::events::{DecodedEvents, EventDecoder};
use crate::domain::instruction::{Instruction, ResourceBudget};
use crate::domain::receipt::{execution_error, ExecutionReceipt};
use crate::domain::tables::TableSet;
use crate::domain::EnvelopeBuilder;
use crate::foundation::{Address, EngineError, Result, TransactionId};
use crate::infrastructure::rpc::{ConfirmationStatus, ProgramRpc};
use crate::infrastructure::signing::{Signer, SignerRegistry};
use log::{debug, info, trace};
use std::sync::Arc;

/// One orchestrated call. The first signer name is the fee payer.
#[derive(Clone, Debug, Default)]
pub struct CallRequest {
    pub instructions: Vec<Instruction>,
    pub signer_names: Vec<String>,
    pub budget: Option<ResourceBudget>,
    pub requested_events: Vec<String>,
}

impl CallRequest {
    pub fn builder() -> CallRequestBuilder {
        CallRequestBuilder::default()
    }
}

#[derive(Clone, Debug, Default)]
pub struct CallRequestBuilder {
    instructions: Vec<Instruction>,
    signer_names: Vec<String>,
    budget: Option<ResourceBudget>,
    requested_events: Vec<String>,
}

impl CallRequestBuilder {
    pub fn instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn signer(mut self, name: impl Into<String>) -> Self {
        self.signer_names.push(name.into());
        self
    }

    pub fn budget(mut self, budget: Option<ResourceBudget>) -> Self {
        self.budget = budget;
        self
    }

    pub fn request_event(mut self, name: impl Into<String>) -> Self {
        self.requested_events.push(name.into());
        self
    }

    pub fn build(self) -> CallRequest {
        CallRequest {
            instructions: self.instructions,
            signer_names: self.signer_names,
            budget: self.budget,
            requested_events: self.requested_events,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CallOutcome {
    pub transaction_id: TransactionId,
    pub receipt: ExecutionReceipt,
    pub events: DecodedEvents,
}

/// Builds, signs, submits, confirms and decodes one atomic call. Stateless
/// between calls; envelopes are built fresh per attempt.
pub struct TransactionOrchestrator {
    rpc: Arc<dyn ProgramRpc>,
    signers: Arc<SignerRegistry>,
    decoder: EventDecoder,
}

impl TransactionOrchestrator {
    pub fn new(rpc: Arc<dyn ProgramRpc>, signers: Arc<SignerRegistry>, authority: Address) -> Self {
        Self { rpc, signers, decoder: EventDecoder::new(authority) }
    }

    /// Pure registry lookup; no I/O.
    pub fn signer_public_key(&self, name: &str) -> Result<Address> {
        self.signers.public_key(name)
    }

    pub async fn execute(&self, request: CallRequest, tables: &TableSet) -> Result<CallOutcome> {
        // Signer resolution is pure lookup and happens before any I/O.
        let fee_payer_name = request
            .signer_names
            .first()
            .ok_or_else(|| EngineError::config("call requires at least a fee-payer signer"))?;
        let fee_payer = self.signers.resolve(fee_payer_name)?;
        let mut resolved: Vec<(String, Arc<dyn Signer>)> = vec![(fee_payer_name.clone(), fee_payer.clone())];
        for name in request.signer_names.iter().skip(1) {
            let signer = self.signers.resolve(name)?;
            if !resolved.iter().any(|(_, existing)| existing.public_key() == signer.public_key()) {
                resolved.push((name.clone(), signer));
            }
        }

        let mut instructions = match request.budget {
            Some(budget) => budget.instructions()?,
            None => Vec::new(),
        };
        let budget_count = instructions.len();
        instructions.extend(request.instructions);

        let blockhash = self.rpc.latest_blockhash().await?;
        let mut envelope = EnvelopeBuilder::new(fee_payer.public_key())
            .instructions(instructions)
            .blockhash(blockhash)
            .compile(tables)?;
        debug!(
            "envelope compiled fee_payer={} instructions={} budget_directives={} resources={} expiry_height={}",
            envelope.fee_payer(),
            envelope.instructions().len(),
            budget_count,
            envelope.resource_count(),
            envelope.expiry_height()
        );

        let digest = envelope.signing_digest()?;
        for (name, signer) in &resolved {
            let signature = signer
                .sign(&digest)
                .await
                .map_err(|err| EngineError::signing(name.clone(), err.to_string()))?;
            envelope.attach_signature(signer.public_key(), signature)?;
            trace!("signature attached signer={} address={}", name, signer.public_key());
        }
        if !envelope.is_fully_signed() {
            let missing: Vec<String> = envelope.missing_signers().iter().map(ToString::to_string).collect();
            return Err(EngineError::config(format!("missing signatures for required signers: {}", missing.join(", "))));
        }

        let id = self.rpc.submit_envelope(&envelope).await?;
        debug!("envelope submitted id={}", id);

        match self.rpc.await_confirmation(&id, envelope.expiry_height()).await? {
            ConfirmationStatus::Committed => {}
            ConfirmationStatus::Dropped => {
                return Err(EngineError::submission(format!("envelope {id} left the pipeline unconfirmed")));
            }
            ConfirmationStatus::Expired => {
                // Ambiguous, not failed: the call may still have landed.
                return Err(EngineError::ConfirmationExpired { expiry_height: envelope.expiry_height() });
            }
        }

        let receipt = self.rpc.fetch_receipt(&id).await?;
        if let Some(code) = receipt.failure_code() {
            return Err(execution_error(code));
        }

        let events = self.decoder.decode(&receipt, &request.requested_events);
        info!(
            "call confirmed id={} log_lines={} events_found={}",
            id,
            receipt.log_lines.len(),
            events.found.len()
        );
        Ok(CallOutcome { transaction_id: id, receipt, events })
    }
}
