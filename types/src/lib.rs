//! Fundamental types for the chain management engine.
//!
//! This crate defines the records shared across every other crate in the
//! workspace: mirrored chains and their organizations, ledger blocks and
//! transactions, contracts, governance policies, proposals and ballots,
//! and the credentials used to reach a ledger node.

pub mod block;
pub mod chain;
pub mod contract;
pub mod error;
pub mod identity;
pub mod policy;
pub mod time;
pub mod vote;

pub use block::{BlockRecord, ChainConfigRecord, TransactionRecord, TxResultRecord};
pub use chain::{Chain, ChainOrg, ChainOrgNode, ChainParams, ChainStatus};
pub use contract::{Contract, ContractOp, ContractStatus, MultiSignStatus};
pub use error::TypesError;
pub use identity::{CertRole, Credentials, NodeInfo, OrgInfo, UserCert};
pub use policy::{Policy, PolicyOrg, PolicyOrgStatus, PolicyRule, ResourceType, RoleType};
pub use time::{Clock, SystemClock, Timestamp};
pub use vote::{Ballot, DispatchOutcome, Proposal, ProposalStatus, VoteResult};
