//! Contract storage trait.

use chainops_types::Contract;

use crate::StoreError;

pub trait ContractStore: Send + Sync {
    fn put_contract(&self, contract: &Contract) -> Result<(), StoreError>;
    fn get_contract(&self, chain_id: &str, name: &str) -> Result<Option<Contract>, StoreError>;
    fn list_contracts(&self, chain_id: &str) -> Result<Vec<Contract>, StoreError>;
}
