//! Policy storage trait.

use chainops_types::{Policy, PolicyOrg, ResourceType};

use crate::StoreError;

pub trait PolicyStore: Send + Sync {
    /// Atomically replace the policy and all org rows of one resource.
    fn replace_policy(&self, policy: &Policy, orgs: &[PolicyOrg]) -> Result<(), StoreError>;

    fn get_policy(
        &self,
        chain_id: &str,
        resource: ResourceType,
    ) -> Result<Option<Policy>, StoreError>;

    fn policy_orgs(
        &self,
        chain_id: &str,
        resource: ResourceType,
    ) -> Result<Vec<PolicyOrg>, StoreError>;
}
