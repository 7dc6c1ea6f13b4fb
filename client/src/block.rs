//! Blocks and topology as delivered by a ledger node.

use serde::{Deserialize, Serialize};

use crate::tx::Transaction;

/// How a member's identity is encoded in `member_info`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberType {
    /// Full certificate, PEM or DER.
    Cert,
    /// Hash of a certificate previously registered on chain.
    CertHash,
    PublicKey,
    Did,
    Alias,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub org_id: String,
    pub member_type: MemberType,
    pub member_info: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub chain_id: String,
    pub block_height: u64,
    pub block_hash: Vec<u8>,
    pub pre_block_hash: Vec<u8>,
    pub dag_hash: Vec<u8>,
    pub rw_set_root: Vec<u8>,
    pub tx_root: Vec<u8>,
    pub consensus_args: Vec<u8>,
    pub block_timestamp: i64,
    pub tx_count: u32,
    pub proposer: Option<Member>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<Transaction>,
}

/// One item of a block subscription.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub block: Block,
}

impl BlockInfo {
    pub fn height(&self) -> u64 {
        self.block.header.block_height
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub node_id: String,
    pub address: String,
}

/// Nodes currently connected to the chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTopology {
    pub block_height: u64,
    pub nodes: Vec<TopologyNode>,
}
