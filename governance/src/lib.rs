//! Multi-organization governance for permissioned chains.
//!
//! Privileged chain operations (contract lifecycle, block parameters,
//! permission policies) run through one workflow:
//! propose → vote → quorum → endorse → submit.
//!
//! Quorum rules are never configured here. They are derived from the
//! chain's own resource policies every time the chain configuration is
//! refreshed, and re-read on every vote.

pub mod action;
pub mod builders;
pub mod directory;
pub mod error;
pub mod message;
pub mod policy;
pub mod quorum;
pub mod workflow;

pub use action::{BlockUpdateParams, ContractRef, DeployParams, GovernedAction, PermissionParams};
pub use builders::{BuildContext, BuildPayload};
pub use directory::{ChainDirectory, ChainHandle};
pub use error::GovernanceError;
pub use policy::{derive_policies, parse_ledger_rule, refresh_policies, DerivedPolicy};
pub use quorum::{parse_percentage, required_approvals, Ratio};
pub use workflow::{GovernanceWorkflow, VoteOutcome, DEFAULT_TX_TIMEOUT};
