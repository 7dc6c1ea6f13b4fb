//! Block ingestion: decode a delivered block into mirror rows and commit
//! them in one store write.
//!
//! Ingestion is idempotent. A block already mirrored at its height is
//! reported as a duplicate and has no side effects.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use chainops_client::payload::{param_key, system_contract};
use chainops_client::{
    BlockInfo, ChainClient, ChainConfig, Member, MemberType, Transaction, TxStatusCode, TxType,
};
use chainops_crypto::common_name;
use chainops_governance::refresh_policies;
use chainops_store::{BlockBundle, InsertOutcome, Store, StoreError};
use chainops_types::{
    BlockRecord, ChainConfigRecord, Contract, ContractOp, MultiSignStatus, Timestamp,
    TransactionRecord, TxResultRecord,
};
use tracing::{debug, info, warn, Instrument};

use crate::metadata::chain_params;
use crate::metrics::NodeMetrics;
use crate::tracing_spans::ingest_span;
use crate::NodeError;

/// What one call to [`BlockIngestor::ingest`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestReport {
    pub height: u64,
    pub outcome: InsertOutcome,
    pub transactions: usize,
    pub contracts: usize,
    /// The block carried a chain configuration change.
    pub config_changed: bool,
}

impl IngestReport {
    fn duplicate(height: u64) -> Self {
        Self {
            height,
            outcome: InsertOutcome::Duplicate,
            transactions: 0,
            contracts: 0,
            config_changed: false,
        }
    }
}

pub struct BlockIngestor {
    chain_id: String,
    store: Arc<dyn Store>,
    client: Arc<dyn ChainClient>,
    metrics: Arc<NodeMetrics>,
}

impl BlockIngestor {
    pub fn new(store: Arc<dyn Store>, client: Arc<dyn ChainClient>, metrics: Arc<NodeMetrics>) -> Self {
        Self {
            chain_id: client.chain_id().to_string(),
            store,
            client,
            metrics,
        }
    }

    pub async fn ingest(&self, info: BlockInfo) -> Result<IngestReport, NodeError> {
        let height = info.height();
        let span = ingest_span(&self.chain_id, height);
        let started = Instant::now();
        let result = self.ingest_inner(info).instrument(span).await;
        match &result {
            Ok(report) if report.outcome == InsertOutcome::Inserted => {
                self.metrics.blocks_ingested.inc();
                self.metrics
                    .transactions_ingested
                    .inc_by(report.transactions as u64);
                self.metrics
                    .ingest_latency_ms
                    .observe(started.elapsed().as_secs_f64() * 1000.0);
            }
            Ok(_) => self.metrics.duplicate_blocks.inc(),
            Err(_) => self.metrics.ingest_failures.inc(),
        }
        result
    }

    async fn ingest_inner(&self, info: BlockInfo) -> Result<IngestReport, NodeError> {
        let chain_id = self.chain_id.as_str();
        let block = info.block;
        let header = &block.header;
        let height = header.block_height;

        match self.store.get_block(chain_id, height) {
            Ok(_) => {
                debug!(chain = %chain_id, height, "block already mirrored");
                return Ok(IngestReport::duplicate(height));
            }
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let mut names = IdentityCache::default();
        let block_ts = Timestamp::from_ledger(header.block_timestamp);
        let block_hash = hex::encode(&header.block_hash);
        let (proposer_org, proposer_id) = match &header.proposer {
            Some(member) => (member.org_id.clone(), names.resolve(&*self.client, member).await),
            None => (String::new(), String::new()),
        };
        let record = BlockRecord {
            chain_id: chain_id.to_string(),
            height,
            block_hash: block_hash.clone(),
            pre_block_hash: hex::encode(&header.pre_block_hash),
            dag_hash: hex::encode(&header.dag_hash),
            rw_set_root: hex::encode(&header.rw_set_root),
            tx_root: hex::encode(&header.tx_root),
            consensus_args: hex::encode(&header.consensus_args),
            timestamp: block_ts,
            tx_count: header.tx_count,
            proposer_org,
            proposer_id,
        };

        let mut transactions = Vec::with_capacity(block.txs.len());
        let mut contracts: Vec<Contract> = Vec::new();
        let mut config_changed = false;
        for tx in &block.txs {
            let mut row = self
                .transaction_record(tx, height, &block_hash, &mut names)
                .await;
            if tx.payload.contract_name == system_contract::CHAIN_CONFIG {
                config_changed = true;
            }
            if let Some(contract) = self.contract_update(tx, &row, block_ts, &contracts)? {
                row.contract_name = contract.name.clone();
                upsert(&mut contracts, contract);
            }
            transactions.push(row);
        }

        let config = if config_changed {
            Some(self.client.get_chain_config().await?)
        } else {
            None
        };
        let config_record = config
            .as_ref()
            .map(|config| -> Result<ChainConfigRecord, NodeError> {
                Ok(ChainConfigRecord {
                    chain_id: chain_id.to_string(),
                    height,
                    timestamp: block_ts,
                    config: serde_json::to_string(config)
                        .map_err(|e| NodeError::Ingest(e.to_string()))?,
                })
            })
            .transpose()?;

        let bundle = BlockBundle {
            block: record,
            transactions,
            contracts,
            config_record,
        };
        let report = IngestReport {
            height,
            outcome: InsertOutcome::Inserted,
            transactions: bundle.transactions.len(),
            contracts: bundle.contracts.len(),
            config_changed,
        };
        if self.store.insert_block(&bundle)? == InsertOutcome::Duplicate {
            return Ok(IngestReport::duplicate(height));
        }

        if let Some(config) = config {
            self.apply_config(&config)?;
        }
        info!(
            chain = %chain_id,
            height,
            txs = report.transactions,
            contracts = report.contracts,
            config_changed,
            "block mirrored"
        );
        Ok(report)
    }

    async fn transaction_record(
        &self,
        tx: &Transaction,
        height: u64,
        block_hash: &str,
        names: &mut IdentityCache,
    ) -> TransactionRecord {
        let payload = &tx.payload;
        let (sender_org, sender) = match &tx.sender {
            Some(entry) => (
                entry.signer.org_id.clone(),
                names.resolve(&*self.client, &entry.signer).await,
            ),
            None => (String::new(), String::new()),
        };
        let mut endorsers = Vec::with_capacity(tx.endorsers.len());
        for entry in &tx.endorsers {
            let name = names.resolve(&*self.client, &entry.signer).await;
            endorsers.push(format!("{}/{}", entry.signer.org_id, name));
        }

        let invoke = payload.tx_type == TxType::InvokeContract;
        let text = |key: &str| {
            payload
                .parameter(key)
                .map(|v| String::from_utf8_lossy(v).into_owned())
                .unwrap_or_default()
        };
        let (contract_name, method, parameters, contract_version, runtime_type) = if invoke {
            (
                payload.contract_name.clone(),
                payload.method.clone(),
                parameters_json(payload.parameters.iter().map(|kv| (&kv.key, &kv.value))),
                text(param_key::CONTRACT_VERSION),
                text(param_key::CONTRACT_RUNTIME_TYPE),
            )
        } else {
            Default::default()
        };

        let result = tx
            .result
            .as_ref()
            .map(|r| {
                let contract = r.contract_result.as_ref();
                TxResultRecord {
                    code: r.code.as_str().to_string(),
                    message: r.message.clone(),
                    rw_set_hash: hex::encode(&r.rw_set_hash),
                    contract_code: contract.map(|c| c.code),
                    contract_message: contract.map(|c| c.message.clone()).unwrap_or_default(),
                    contract_result: contract.map(|c| hex::encode(&c.result)).unwrap_or_default(),
                    gas_used: contract.map(|c| c.gas_used).unwrap_or_default(),
                }
            })
            .unwrap_or_default();

        TransactionRecord {
            chain_id: self.chain_id.clone(),
            tx_id: payload.tx_id.clone(),
            block_height: height,
            block_hash: block_hash.to_string(),
            timestamp: Timestamp::from_ledger(payload.timestamp),
            tx_type: payload.tx_type.as_str().to_string(),
            sender_org,
            sender,
            endorsers,
            contract_name,
            method,
            parameters,
            contract_version,
            runtime_type,
            result,
        }
    }

    /// Contract row change caused by a successful contract management call.
    fn contract_update(
        &self,
        tx: &Transaction,
        row: &TransactionRecord,
        at: Timestamp,
        pending: &[Contract],
    ) -> Result<Option<Contract>, NodeError> {
        let payload = &tx.payload;
        if payload.contract_name != system_contract::CONTRACT_MANAGE {
            return Ok(None);
        }
        let Some(op) = ContractOp::from_method(&payload.method) else {
            return Ok(None);
        };
        let succeeded = tx.result.as_ref().is_some_and(|r| {
            r.code == TxStatusCode::Success
                && r.contract_result.as_ref().map_or(true, |c| c.code == 0)
        });
        if !succeeded {
            return Ok(None);
        }
        let Some(name) = payload
            .parameter(param_key::CONTRACT_NAME)
            .map(|v| String::from_utf8_lossy(v).into_owned())
        else {
            warn!(chain = %self.chain_id, tx = %payload.tx_id, "contract management call without a contract name");
            return Ok(None);
        };

        let existing = match pending.iter().find(|c| c.name == name) {
            Some(c) => Some(c.clone()),
            None => self.store.get_contract(&self.chain_id, &name)?,
        };
        let mut contract = existing.unwrap_or_else(|| Contract {
            chain_id: self.chain_id.clone(),
            name: name.clone(),
            version: String::new(),
            runtime_type: String::new(),
            org_id: row.sender_org.clone(),
            status: op.success_status(),
            multi_sign_status: MultiSignStatus::NoVoting,
            tx_id: None,
            updated_at: at,
        });
        if matches!(op, ContractOp::Init | ContractOp::Upgrade) {
            if let Some(version) = payload.parameter(param_key::CONTRACT_VERSION) {
                contract.version = String::from_utf8_lossy(version).into_owned();
            }
            if let Some(runtime) = payload.parameter(param_key::CONTRACT_RUNTIME_TYPE) {
                contract.runtime_type = String::from_utf8_lossy(runtime).into_owned();
            }
        }
        contract.status = op.success_status();
        contract.tx_id = Some(payload.tx_id.clone());
        contract.updated_at = at;
        Ok(Some(contract))
    }

    fn apply_config(&self, config: &ChainConfig) -> Result<(), NodeError> {
        self.store
            .update_chain_params(&self.chain_id, &chain_params(config))?;
        let refreshed = refresh_policies(&*self.store, &self.chain_id, config)?;
        debug!(chain = %self.chain_id, policies = refreshed, "chain configuration applied");
        Ok(())
    }
}

fn upsert(contracts: &mut Vec<Contract>, contract: Contract) {
    match contracts.iter_mut().find(|c| c.name == contract.name) {
        Some(slot) => *slot = contract,
        None => contracts.push(contract),
    }
}

/// Invoke parameters as a JSON object. Bytecode is left out.
fn parameters_json<'a>(params: impl Iterator<Item = (&'a String, &'a Vec<u8>)>) -> String {
    let map: BTreeMap<&str, String> = params
        .filter(|(key, _)| key.as_str() != param_key::CONTRACT_BYTECODE)
        .map(|(key, value)| (key.as_str(), String::from_utf8_lossy(value).into_owned()))
        .collect();
    serde_json::to_string(&map).unwrap_or_default()
}

/// Display names of ledger members, resolved once per block.
#[derive(Default)]
struct IdentityCache {
    names: HashMap<Vec<u8>, String>,
}

impl IdentityCache {
    async fn resolve(&mut self, client: &dyn ChainClient, member: &Member) -> String {
        if let Some(name) = self.names.get(&member.member_info) {
            return name.clone();
        }
        let name = match member.member_type {
            MemberType::Cert => cert_name(&member.member_info),
            MemberType::CertHash => {
                let hash = hex::encode(&member.member_info);
                match client.query_cert(std::slice::from_ref(&hash)).await {
                    Ok(certs) => certs
                        .iter()
                        .find(|c| c.hash == hash)
                        .map(|c| cert_name(&c.cert))
                        .unwrap_or_default(),
                    Err(e) => {
                        warn!(hash = %hash, error = %e, "certificate lookup failed");
                        String::new()
                    }
                }
            }
            MemberType::PublicKey | MemberType::Did | MemberType::Alias => {
                String::from_utf8_lossy(&member.member_info).into_owned()
            }
        };
        self.names.insert(member.member_info.clone(), name.clone());
        name
    }
}

fn cert_name(cert: &[u8]) -> String {
    common_name(cert).unwrap_or_else(|e| {
        debug!(error = %e, "member certificate has no usable subject");
        String::new()
    })
}
