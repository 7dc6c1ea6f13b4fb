//! LMDB implementation of RelationStore.

use chainops_store::{RelationStore, StoreError};
use chainops_types::{ChainOrg, ChainOrgNode};
use heed::types::{SerdeBincode, Str};
use heed::{Database, RwTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::environment::{key, prefix};
use crate::{LmdbEnvironment, LmdbError};

/// Delete every key under `prefix`.
pub(crate) fn clear_prefix<T>(
    db: Database<Str, SerdeBincode<T>>,
    wtxn: &mut RwTxn<'_>,
    prefix: &str,
) -> Result<(), LmdbError>
where
    T: Serialize + DeserializeOwned + 'static,
{
    let keys: Vec<String> = db
        .prefix_iter(wtxn, prefix)?
        .map(|entry| entry.map(|(k, _)| k.to_string()))
        .collect::<Result<_, _>>()?;
    for k in keys {
        db.delete(wtxn, &k)?;
    }
    Ok(())
}

/// Every value under `prefix`, in key order.
pub(crate) fn collect_prefix<T>(
    env: &LmdbEnvironment,
    db: Database<Str, SerdeBincode<T>>,
    prefix: &str,
) -> Result<Vec<T>, LmdbError>
where
    T: Serialize + DeserializeOwned + 'static,
{
    let rtxn = env.env.read_txn()?;
    let values = db
        .prefix_iter(&rtxn, prefix)?
        .map(|entry| entry.map(|(_, v)| v))
        .collect::<Result<_, _>>()?;
    Ok(values)
}

impl RelationStore for LmdbEnvironment {
    fn replace_chain_orgs(&self, chain_id: &str, orgs: &[ChainOrg]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        clear_prefix(self.chain_orgs_db, &mut wtxn, &prefix(&[chain_id]))?;
        for org in orgs {
            self.chain_orgs_db
                .put(&mut wtxn, &key(&[chain_id, &org.org_id]), org)
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn chain_orgs(&self, chain_id: &str) -> Result<Vec<ChainOrg>, StoreError> {
        Ok(collect_prefix(self, self.chain_orgs_db, &prefix(&[chain_id]))?)
    }

    fn replace_chain_org_nodes(
        &self,
        chain_id: &str,
        nodes: &[ChainOrgNode],
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        clear_prefix(self.chain_org_nodes_db, &mut wtxn, &prefix(&[chain_id]))?;
        for node in nodes {
            self.chain_org_nodes_db
                .put(
                    &mut wtxn,
                    &key(&[chain_id, &node.org_id, &node.node_id]),
                    node,
                )
                .map_err(LmdbError::from)?;
        }
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn chain_org_nodes(&self, chain_id: &str) -> Result<Vec<ChainOrgNode>, StoreError> {
        Ok(collect_prefix(self, self.chain_org_nodes_db, &prefix(&[chain_id]))?)
    }
}
