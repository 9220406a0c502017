//! Identity of the remote program being driven.

use crate::domain::resource::ResourceClaim;
use crate::foundation::Address;

/// Fixed addresses every advance call touches, independent of the step.
///
/// The per-step working set is this baseline merged with the claims the
/// remote declares for the upcoming command.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ControllerProfile {
    /// The program under drive.
    pub program_id: Address,
    /// The program's self-invocation authority; nested invocations addressed
    /// to it carry re-encoded event frames.
    pub authority: Address,
    /// Housekeeping/system resource required by every call.
    pub system_resource: Address,
    /// Program owning the address-compaction tables.
    pub table_program: Address,
    /// Receipt-token identifiers minted against as steps complete.
    pub receipt_tokens: Vec<Address>,
    /// Externally supplied pricing-source resources.
    pub pricing_sources: Vec<Address>,
}

impl ControllerProfile {
    /// The fixed core claim set for one advance call by `fee_payer`.
    pub fn core_claims(&self, fee_payer: Address) -> Vec<ResourceClaim> {
        let mut claims = vec![
            ResourceClaim::writable_signer(fee_payer),
            ResourceClaim::read_only(self.program_id),
            ResourceClaim::read_only(self.authority),
            ResourceClaim::read_only(self.system_resource),
        ];
        claims.extend(self.receipt_tokens.iter().map(|token| ResourceClaim::writable(*token)));
        claims.extend(self.pricing_sources.iter().map(|source| ResourceClaim::read_only(*source)));
        claims
    }
}
