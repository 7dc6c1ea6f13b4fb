//! LMDB implementation of LedgerStore.

use chainops_store::{BlockBundle, InsertOutcome, LedgerStore, StoreError};
use chainops_types::{BlockRecord, ChainConfigRecord, Timestamp, TransactionRecord};

use crate::environment::{key, padded, prefix};
use crate::relation::collect_prefix;
use crate::{LmdbEnvironment, LmdbError};

impl LedgerStore for LmdbEnvironment {
    fn insert_block(&self, bundle: &BlockBundle) -> Result<InsertOutcome, StoreError> {
        let block = &bundle.block;
        let chain_id = block.chain_id.as_str();
        let block_key = key(&[chain_id, &padded(block.height)]);

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .blocks_db
            .get(&wtxn, &block_key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Ok(InsertOutcome::Duplicate);
        }
        self.blocks_db
            .put(&mut wtxn, &block_key, block)
            .map_err(LmdbError::from)?;

        for tx in &bundle.transactions {
            let tx_key = key(&[chain_id, &tx.tx_id]);
            if self
                .txs_db
                .get(&wtxn, &tx_key)
                .map_err(LmdbError::from)?
                .is_some()
            {
                tracing::debug!(chain = chain_id, tx_id = %tx.tx_id, "transaction already mirrored");
                continue;
            }
            self.txs_db
                .put(&mut wtxn, &tx_key, tx)
                .map_err(LmdbError::from)?;
        }

        for contract in &bundle.contracts {
            self.contracts_db
                .put(&mut wtxn, &key(&[chain_id, &contract.name]), contract)
                .map_err(LmdbError::from)?;
        }

        if let Some(record) = &bundle.config_record {
            let record_key = key(&[
                chain_id,
                &padded(record.timestamp.as_secs()),
                &padded(record.height),
            ]);
            self.config_records_db
                .put(&mut wtxn, &record_key, record)
                .map_err(LmdbError::from)?;
        }

        wtxn.commit().map_err(LmdbError::from)?;
        Ok(InsertOutcome::Inserted)
    }

    fn max_block_height(&self, chain_id: &str) -> Result<Option<u64>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let last = self
            .blocks_db
            .rev_prefix_iter(&rtxn, &prefix(&[chain_id]))
            .map_err(LmdbError::from)?
            .next()
            .transpose()
            .map_err(LmdbError::from)?;
        Ok(last.map(|(_, block)| block.height))
    }

    fn get_block(&self, chain_id: &str, height: u64) -> Result<BlockRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let block = self
            .blocks_db
            .get(&rtxn, &key(&[chain_id, &padded(height)]))
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("block {chain_id}/{height}")))?;
        Ok(block)
    }

    fn list_blocks(&self, chain_id: &str) -> Result<Vec<BlockRecord>, StoreError> {
        Ok(collect_prefix(self, self.blocks_db, &prefix(&[chain_id]))?)
    }

    fn get_transaction(
        &self,
        chain_id: &str,
        tx_id: &str,
    ) -> Result<TransactionRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let tx = self
            .txs_db
            .get(&rtxn, &key(&[chain_id, tx_id]))
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("transaction {chain_id}/{tx_id}")))?;
        Ok(tx)
    }

    fn transaction_count(&self, chain_id: &str) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut count = 0u64;
        for entry in self
            .txs_db
            .prefix_iter(&rtxn, &prefix(&[chain_id]))
            .map_err(LmdbError::from)?
        {
            entry.map_err(LmdbError::from)?;
            count += 1;
        }
        Ok(count)
    }

    fn latest_config_record(
        &self,
        chain_id: &str,
        at: Timestamp,
    ) -> Result<Option<ChainConfigRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        for entry in self
            .config_records_db
            .rev_prefix_iter(&rtxn, &prefix(&[chain_id]))
            .map_err(LmdbError::from)?
        {
            let (_, record) = entry.map_err(LmdbError::from)?;
            if record.timestamp <= at {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}
