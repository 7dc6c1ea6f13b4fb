//! Abstract storage traits for the chain management engine.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits, usually
//! through the [`Store`] union shared as `Arc<dyn Store>`.

pub mod chain;
pub mod contract;
pub mod error;
pub mod ledger;
pub mod participant;
pub mod policy;
pub mod relation;
pub mod vote;

pub use chain::ChainStore;
pub use contract::ContractStore;
pub use error::StoreError;
pub use ledger::{BlockBundle, InsertOutcome, LedgerStore};
pub use participant::ParticipantStore;
pub use policy::PolicyStore;
pub use relation::RelationStore;
pub use vote::{VoteRecord, VoteStore};

/// Every store the engine needs, behind one object.
pub trait Store:
    ChainStore
    + RelationStore
    + ParticipantStore
    + LedgerStore
    + ContractStore
    + PolicyStore
    + VoteStore
{
}

impl<T> Store for T where
    T: ChainStore
        + RelationStore
        + ParticipantStore
        + LedgerStore
        + ContractStore
        + PolicyStore
        + VoteStore
{
}
