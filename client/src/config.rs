//! Chain configuration as reported by a ledger node.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: String,
    pub version: String,
    /// Incremented by every accepted configuration update.
    pub sequence: u64,
    pub consensus: String,
    pub block: BlockConfig,
    pub trust_roots: Vec<TrustRoot>,
    pub resource_policies: Vec<ResourcePolicy>,
}

impl ChainConfig {
    pub fn trusted_org_ids(&self) -> impl Iterator<Item = &str> {
        self.trust_roots.iter().map(|root| root.org_id.as_str())
    }

    pub fn resource_policy(&self, resource_name: &str) -> Option<&LedgerPolicy> {
        self.resource_policies
            .iter()
            .find(|rp| rp.resource_name == resource_name)
            .map(|rp| &rp.policy)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockConfig {
    pub tx_timestamp_verify: bool,
    /// Seconds.
    pub tx_timeout: u32,
    pub block_tx_capacity: u32,
    /// Megabytes.
    pub block_size: u32,
    /// Milliseconds.
    pub block_interval: u32,
}

/// An organization's CA roots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustRoot {
    pub org_id: String,
    pub root: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePolicy {
    pub resource_name: String,
    pub policy: LedgerPolicy,
}

/// Access rule as stored on the ledger. `rule` is a rule name or a
/// percentage string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerPolicy {
    pub rule: String,
    pub org_list: Vec<String>,
    pub role_list: Vec<String>,
}
