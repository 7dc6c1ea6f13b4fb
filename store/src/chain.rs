//! Chain storage trait.

use chainops_types::{Chain, ChainParams, ChainStatus};

use crate::StoreError;

pub trait ChainStore: Send + Sync {
    fn put_chain(&self, chain: &Chain) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] for an unregistered chain.
    fn get_chain(&self, chain_id: &str) -> Result<Chain, StoreError>;

    fn list_chains(&self) -> Result<Vec<Chain>, StoreError>;

    fn set_chain_status(&self, chain_id: &str, status: ChainStatus) -> Result<(), StoreError>;

    /// Overwrite the ledger-derived fields of a chain in one write, keeping
    /// its status. An unknown chain is created as `NotStarted`.
    fn update_chain_params(&self, chain_id: &str, params: &ChainParams)
        -> Result<(), StoreError>;
}
