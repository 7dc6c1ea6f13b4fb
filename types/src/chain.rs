//! Mirrored chain records.

use serde::{Deserialize, Serialize};

/// Liveness of a chain's subscription.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainStatus {
    /// Registered but never subscribed.
    #[default]
    NotStarted,
    /// A block listener is running.
    Working,
    /// The subscription ended (stream closed, malformed data, or unsubscribed).
    NoWork,
}

/// A chain managed by this backend.
///
/// `chain_name`, `tls` and `monitor` come from registration; every other
/// field is overwritten from the ledger on each metadata refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub chain_id: String,
    pub chain_name: String,
    pub consensus: String,
    pub block_tx_capacity: u32,
    /// Block interval in milliseconds.
    pub block_interval: u32,
    /// Transaction timeout in seconds.
    pub tx_timeout: u32,
    pub version: String,
    pub sequence: u64,
    pub tls: bool,
    pub monitor: bool,
    pub status: ChainStatus,
}

impl Chain {
    pub fn new(chain_id: impl Into<String>, chain_name: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            chain_name: chain_name.into(),
            consensus: String::new(),
            block_tx_capacity: 0,
            block_interval: 0,
            tx_timeout: 0,
            version: String::new(),
            sequence: 0,
            tls: true,
            monitor: false,
            status: ChainStatus::NotStarted,
        }
    }
}

/// The part of a [`Chain`] read from the ledger configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub consensus: String,
    pub block_tx_capacity: u32,
    pub block_interval: u32,
    pub tx_timeout: u32,
    pub version: String,
    pub sequence: u64,
}

impl Chain {
    /// Overwrite the ledger-derived fields. Registration fields and the
    /// subscription status are left alone.
    pub fn apply_params(&mut self, params: &ChainParams) {
        self.consensus = params.consensus.clone();
        self.block_tx_capacity = params.block_tx_capacity;
        self.block_interval = params.block_interval;
        self.tx_timeout = params.tx_timeout;
        self.version = params.version.clone();
        self.sequence = params.sequence;
    }
}

/// An organization that is a trust root of a chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainOrg {
    pub chain_id: String,
    pub org_id: String,
    pub org_name: String,
}

/// A consensus or sync node of a chain, attributed to its organization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainOrgNode {
    pub chain_id: String,
    pub org_id: String,
    pub org_name: String,
    pub node_id: String,
    pub node_name: String,
}
