//! Proposal and ballot storage trait.
//!
//! `record_vote` and `claim_finalization` are compare-and-swap operations:
//! implementations must perform the check and the write atomically.

use chainops_types::{Ballot, DispatchOutcome, Proposal, ProposalStatus, Timestamp, VoteResult};

use crate::StoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteRecord {
    Recorded,
    /// The ballot already held a vote. It was left unchanged.
    AlreadyVoted,
}

pub trait VoteStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] if the multi id exists.
    fn create_proposal(&self, proposal: &Proposal, ballots: &[Ballot]) -> Result<(), StoreError>;

    fn get_proposal(&self, multi_id: &str) -> Result<Option<Proposal>, StoreError>;

    fn list_proposals(&self, chain_id: &str) -> Result<Vec<Proposal>, StoreError>;

    fn ballots(&self, multi_id: &str) -> Result<Vec<Ballot>, StoreError>;

    /// Set a pending ballot. Fails with [`StoreError::NotFound`] if the org
    /// has no ballot on the proposal.
    fn record_vote(
        &self,
        multi_id: &str,
        org_id: &str,
        result: VoteResult,
        at: Timestamp,
    ) -> Result<VoteRecord, StoreError>;

    /// Move a proposal out of `Voting`. Returns `true` for exactly one caller.
    fn claim_finalization(&self, multi_id: &str, status: ProposalStatus)
        -> Result<bool, StoreError>;

    fn set_outcome(&self, multi_id: &str, outcome: &DispatchOutcome) -> Result<(), StoreError>;
}
