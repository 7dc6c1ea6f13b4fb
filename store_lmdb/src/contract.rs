//! LMDB implementation of ContractStore.

use chainops_store::{ContractStore, StoreError};
use chainops_types::Contract;

use crate::environment::{key, prefix};
use crate::relation::collect_prefix;
use crate::{LmdbEnvironment, LmdbError};

impl ContractStore for LmdbEnvironment {
    fn put_contract(&self, contract: &Contract) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.contracts_db
            .put(&mut wtxn, &key(&[&contract.chain_id, &contract.name]), contract)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_contract(&self, chain_id: &str, name: &str) -> Result<Option<Contract>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self
            .contracts_db
            .get(&rtxn, &key(&[chain_id, name]))
            .map_err(LmdbError::from)?)
    }

    fn list_contracts(&self, chain_id: &str) -> Result<Vec<Contract>, StoreError> {
        Ok(collect_prefix(self, self.contracts_db, &prefix(&[chain_id]))?)
    }
}
