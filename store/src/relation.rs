//! Chain ↔ organization ↔ node relations mirrored from the ledger.

use chainops_types::{ChainOrg, ChainOrgNode};

use crate::StoreError;

pub trait RelationStore: Send + Sync {
    /// Replace every org row of the chain.
    fn replace_chain_orgs(&self, chain_id: &str, orgs: &[ChainOrg]) -> Result<(), StoreError>;

    fn chain_orgs(&self, chain_id: &str) -> Result<Vec<ChainOrg>, StoreError>;

    /// Replace every org-node row of the chain.
    fn replace_chain_org_nodes(
        &self,
        chain_id: &str,
        nodes: &[ChainOrgNode],
    ) -> Result<(), StoreError>;

    fn chain_org_nodes(&self, chain_id: &str) -> Result<Vec<ChainOrgNode>, StoreError>;
}
