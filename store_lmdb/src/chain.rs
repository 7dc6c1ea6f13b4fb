//! LMDB implementation of ChainStore.

use chainops_store::{ChainStore, StoreError};
use chainops_types::{Chain, ChainParams, ChainStatus};

use crate::{LmdbEnvironment, LmdbError};

impl ChainStore for LmdbEnvironment {
    fn put_chain(&self, chain: &Chain) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.chains_db
            .put(&mut wtxn, &chain.chain_id, chain)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_chain(&self, chain_id: &str) -> Result<Chain, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let chain = self
            .chains_db
            .get(&rtxn, chain_id)
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("chain {chain_id}")))?;
        Ok(chain)
    }

    fn list_chains(&self) -> Result<Vec<Chain>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut chains = Vec::new();
        for entry in self.chains_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, chain) = entry.map_err(LmdbError::from)?;
            chains.push(chain);
        }
        Ok(chains)
    }

    fn set_chain_status(&self, chain_id: &str, status: ChainStatus) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut chain = self
            .chains_db
            .get(&wtxn, chain_id)
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("chain {chain_id}")))?;
        chain.status = status;
        self.chains_db
            .put(&mut wtxn, chain_id, &chain)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn update_chain_params(
        &self,
        chain_id: &str,
        params: &ChainParams,
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut chain = self
            .chains_db
            .get(&wtxn, chain_id)
            .map_err(LmdbError::from)?
            .unwrap_or_else(|| Chain::new(chain_id, chain_id));
        chain.apply_params(params);
        self.chains_db
            .put(&mut wtxn, chain_id, &chain)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
