//! Governance proposals and ballots.

use serde::{Deserialize, Serialize};

use crate::policy::ResourceType;
use crate::time::Timestamp;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteResult {
    #[default]
    Pending,
    Approve,
    Reject,
}

/// One organization's vote on a proposal. Written at most once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub multi_id: String,
    pub chain_id: String,
    pub org_id: String,
    pub org_name: String,
    pub result: VoteResult,
    pub voted_at: Option<Timestamp>,
}

impl Ballot {
    pub fn pending(
        multi_id: impl Into<String>,
        chain_id: impl Into<String>,
        org_id: impl Into<String>,
        org_name: impl Into<String>,
    ) -> Self {
        Self {
            multi_id: multi_id.into(),
            chain_id: chain_id.into(),
            org_id: org_id.into(),
            org_name: org_name.into(),
            result: VoteResult::Pending,
            voted_at: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    #[default]
    Voting,
    Approved,
    /// The policy became FORBIDDEN while the vote was open.
    RejectedForbidden,
}

impl ProposalStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Voting)
    }
}

/// Result of submitting an approved proposal to the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchOutcome {
    Succeeded { tx_id: String },
    /// Nothing to submit: the ledger already holds the requested values.
    Unchanged,
    Failed { reason: String },
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub multi_id: String,
    pub chain_id: String,
    pub resource: ResourceType,
    /// Organization of the connection that opened the vote.
    pub start_org: String,
    pub reason: String,
    /// Rendered, human-readable summary of the change.
    pub description: String,
    /// JSON-encoded action parameters.
    pub params: String,
    /// Governed contract, for contract operations.
    pub target: Option<String>,
    pub created_at: Timestamp,
    pub status: ProposalStatus,
    pub outcome: Option<DispatchOutcome>,
}
