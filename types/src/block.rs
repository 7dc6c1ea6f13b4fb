//! Mirrored ledger content.
//!
//! Rows are append-only: one [`BlockRecord`] per (chain, height) and one
//! [`TransactionRecord`] per (chain, tx id).

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub chain_id: String,
    pub height: u64,
    /// Hex-encoded header fields.
    pub block_hash: String,
    pub pre_block_hash: String,
    pub dag_hash: String,
    pub rw_set_root: String,
    pub tx_root: String,
    pub consensus_args: String,
    pub timestamp: Timestamp,
    pub tx_count: u32,
    pub proposer_org: String,
    pub proposer_id: String,
}

/// Execution result of a mirrored transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResultRecord {
    pub code: String,
    pub message: String,
    pub rw_set_hash: String,
    pub contract_code: Option<u32>,
    pub contract_message: String,
    /// Hex-encoded contract return value.
    pub contract_result: String,
    pub gas_used: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub chain_id: String,
    pub tx_id: String,
    pub block_height: u64,
    pub block_hash: String,
    pub timestamp: Timestamp,
    pub tx_type: String,
    pub sender_org: String,
    pub sender: String,
    /// `org/member` per endorsement.
    pub endorsers: Vec<String>,
    pub contract_name: String,
    pub method: String,
    /// Invocation parameters as a JSON object.
    pub parameters: String,
    pub contract_version: String,
    pub runtime_type: String,
    pub result: TxResultRecord,
}

/// Snapshot of a chain's configuration taken when a config transaction
/// was mirrored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfigRecord {
    pub chain_id: String,
    pub height: u64,
    pub timestamp: Timestamp,
    /// JSON-encoded configuration.
    pub config: String,
}
