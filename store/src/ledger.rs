//! Mirrored ledger content.

use chainops_types::{BlockRecord, ChainConfigRecord, Contract, Timestamp, TransactionRecord};

use crate::StoreError;

/// Everything derived from one block, committed together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockBundle {
    pub block: BlockRecord,
    pub transactions: Vec<TransactionRecord>,
    /// Contract rows to upsert.
    pub contracts: Vec<Contract>,
    pub config_record: Option<ChainConfigRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A block already exists at this (chain, height). Nothing was written.
    Duplicate,
}

pub trait LedgerStore: Send + Sync {
    /// Atomically insert a block with its transactions, contract updates
    /// and config snapshot. Unique on (chain, height); transactions whose
    /// (chain, tx id) already exists are skipped.
    fn insert_block(&self, bundle: &BlockBundle) -> Result<InsertOutcome, StoreError>;

    fn max_block_height(&self, chain_id: &str) -> Result<Option<u64>, StoreError>;

    fn get_block(&self, chain_id: &str, height: u64) -> Result<BlockRecord, StoreError>;

    /// Blocks in ascending height order.
    fn list_blocks(&self, chain_id: &str) -> Result<Vec<BlockRecord>, StoreError>;

    fn get_transaction(&self, chain_id: &str, tx_id: &str)
        -> Result<TransactionRecord, StoreError>;

    fn transaction_count(&self, chain_id: &str) -> Result<u64, StoreError>;

    /// Latest config snapshot taken at or before `at`.
    fn latest_config_record(
        &self,
        chain_id: &str,
        at: Timestamp,
    ) -> Result<Option<ChainConfigRecord>, StoreError>;
}
