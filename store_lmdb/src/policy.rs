//! LMDB implementation of PolicyStore.

use chainops_store::{PolicyStore, StoreError};
use chainops_types::{Policy, PolicyOrg, ResourceType};

use crate::environment::{key, prefix};
use crate::relation::{clear_prefix, collect_prefix};
use crate::{LmdbEnvironment, LmdbError};

fn resource_part(resource: ResourceType) -> String {
    format!("{:02}", resource.code())
}

impl PolicyStore for LmdbEnvironment {
    fn replace_policy(&self, policy: &Policy, orgs: &[PolicyOrg]) -> Result<(), StoreError> {
        let resource = resource_part(policy.resource);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.policies_db
            .put(&mut wtxn, &key(&[&policy.chain_id, &resource]), policy)
            .map_err(LmdbError::from)?;
        clear_prefix(
            self.policy_orgs_db,
            &mut wtxn,
            &prefix(&[&policy.chain_id, &resource]),
        )?;
        for org in orgs {
            self.policy_orgs_db
                .put(
                    &mut wtxn,
                    &key(&[&policy.chain_id, &resource, &org.org_id]),
                    org,
                )
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_policy(
        &self,
        chain_id: &str,
        resource: ResourceType,
    ) -> Result<Option<Policy>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self
            .policies_db
            .get(&rtxn, &key(&[chain_id, &resource_part(resource)]))
            .map_err(LmdbError::from)?)
    }

    fn policy_orgs(
        &self,
        chain_id: &str,
        resource: ResourceType,
    ) -> Result<Vec<PolicyOrg>, StoreError> {
        Ok(collect_prefix(
            self,
            self.policy_orgs_db,
            &prefix(&[chain_id, &resource_part(resource)]),
        )?)
    }
}
