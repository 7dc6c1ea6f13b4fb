use chainops_client::ClientError;
use chainops_store::StoreError;
use chainops_types::{CertRole, ContractOp, ContractStatus, ResourceType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("chain {0} is not subscribed")]
    NotSubscribed(String),

    #[error("chain {0} not found")]
    ChainNotFound(String),

    #[error("contract {0} not found")]
    ContractNotFound(String),

    #[error("contract {0} already exists")]
    ContractExists(String),

    #[error("no policy for {resource} on chain {chain_id}")]
    PolicyNotFound {
        chain_id: String,
        resource: ResourceType,
    },

    #[error("{0} is forbidden by chain policy")]
    ForbiddenPolicy(ResourceType),

    #[error("SELF policy on {0} is not supported for multi-organization votes")]
    UnsupportedSelfPolicy(ResourceType),

    #[error("malformed percentage: {0}")]
    MalformedPercentage(String),

    #[error("invalid policy rule: {0}")]
    InvalidPolicyRule(String),

    #[error("no organization is eligible to vote on {0}")]
    NoEligibleOrgs(ResourceType),

    #[error("proposal {0} not found")]
    ProposalNotFound(String),

    #[error("organization {org_id} has no ballot on proposal {multi_id}")]
    BallotNotFound { multi_id: String, org_id: String },

    #[error("organization {org_id} has already voted on proposal {multi_id}")]
    AlreadyVoted { multi_id: String, org_id: String },

    #[error("proposal {0} is already finalized")]
    AlreadyFinalized(String),

    #[error("contract {0} already has a vote in progress")]
    ContractBeingVoted(String),

    #[error("cannot {op:?} contract {contract} in state {status:?}")]
    IllegalContractState {
        contract: String,
        op: ContractOp,
        status: Option<ContractStatus>,
    },

    #[error("organization {org_id} has no {role} certificate")]
    MissingCertificate { org_id: String, role: CertRole },

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("dispatch of proposal {multi_id} failed: {reason}")]
    Dispatch { multi_id: String, reason: String },

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GovernanceError {
    fn from(e: serde_json::Error) -> Self {
        GovernanceError::Serialization(e.to_string())
    }
}
