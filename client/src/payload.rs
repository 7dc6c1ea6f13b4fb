//! Canonical payloads for the ledger's system contracts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::LedgerPolicy;
use crate::tx::{KeyValuePair, Payload, TxType};

/// System contract names.
pub mod system_contract {
    pub const CHAIN_CONFIG: &str = "CHAIN_CONFIG";
    pub const CONTRACT_MANAGE: &str = "CONTRACT_MANAGE";
    pub const CERT_MANAGE: &str = "CERT_MANAGE";
}

/// Methods of the chain configuration contract.
pub mod config_method {
    pub const BLOCK_UPDATE: &str = "BLOCK_UPDATE";
    pub const PERMISSION_UPDATE: &str = "PERMISSION_UPDATE";
}

/// Parameter keys understood by the system contracts.
pub mod param_key {
    pub const CONTRACT_NAME: &str = "CONTRACT_NAME";
    pub const CONTRACT_VERSION: &str = "CONTRACT_VERSION";
    pub const CONTRACT_RUNTIME_TYPE: &str = "CONTRACT_RUNTIME_TYPE";
    pub const CONTRACT_BYTECODE: &str = "CONTRACT_BYTECODE";
    pub const TX_TIMESTAMP_VERIFY: &str = "tx_timestamp_verify";
    pub const TX_TIMEOUT: &str = "tx_timeout";
    pub const BLOCK_TX_CAPACITY: &str = "block_tx_capacity";
    pub const BLOCK_SIZE: &str = "block_size";
    pub const BLOCK_INTERVAL: &str = "block_interval";
}

/// Block size (MB) written with every block update.
pub const DEFAULT_BLOCK_SIZE: u32 = 10;

/// New block parameters. Zero fields are left unchanged by the ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BlockUpdate {
    pub sequence: u64,
    pub tx_timestamp_verify: bool,
    pub tx_timeout: u32,
    pub block_tx_capacity: u32,
    pub block_size: u32,
    pub block_interval: u32,
}

static TX_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Random 32-byte transaction id, hex encoded.
pub fn new_tx_id() -> String {
    let mut id = [0u8; 32];
    if getrandom::getrandom(&mut id).is_err() {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        id[..16].copy_from_slice(&nanos.to_be_bytes());
        let seq = TX_COUNTER.fetch_add(1, Ordering::Relaxed);
        id[16..24].copy_from_slice(&seq.to_be_bytes());
    }
    hex::encode(id)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

fn system_payload(
    chain_id: &str,
    contract: &str,
    method: &str,
    parameters: Vec<KeyValuePair>,
    sequence: u64,
) -> Payload {
    Payload {
        chain_id: chain_id.to_string(),
        tx_type: TxType::InvokeContract,
        tx_id: new_tx_id(),
        timestamp: unix_now(),
        contract_name: contract.to_string(),
        method: method.to_string(),
        parameters,
        sequence,
    }
}

/// Install or upgrade: `method` is `INIT_CONTRACT` or `UPGRADE_CONTRACT`.
pub fn contract_deploy(
    chain_id: &str,
    method: &str,
    name: &str,
    version: &str,
    bytecode: &[u8],
    runtime_type: &str,
    init_params: &[KeyValuePair],
) -> Payload {
    let mut params = vec![
        KeyValuePair::new(param_key::CONTRACT_NAME, name.as_bytes()),
        KeyValuePair::new(param_key::CONTRACT_VERSION, version.as_bytes()),
        KeyValuePair::new(param_key::CONTRACT_RUNTIME_TYPE, runtime_type.as_bytes()),
        KeyValuePair::new(param_key::CONTRACT_BYTECODE, bytecode),
    ];
    params.extend(init_params.iter().cloned());
    system_payload(chain_id, system_contract::CONTRACT_MANAGE, method, params, 0)
}

/// Freeze, unfreeze or revoke by contract name.
pub fn contract_state_change(chain_id: &str, method: &str, name: &str) -> Payload {
    let params = vec![KeyValuePair::new(param_key::CONTRACT_NAME, name.as_bytes())];
    system_payload(chain_id, system_contract::CONTRACT_MANAGE, method, params, 0)
}

pub fn block_update(chain_id: &str, update: &BlockUpdate) -> Payload {
    let mut params = vec![KeyValuePair::new(
        param_key::TX_TIMESTAMP_VERIFY,
        update.tx_timestamp_verify.to_string(),
    )];
    let numeric = [
        (param_key::TX_TIMEOUT, update.tx_timeout),
        (param_key::BLOCK_TX_CAPACITY, update.block_tx_capacity),
        (param_key::BLOCK_SIZE, update.block_size),
        (param_key::BLOCK_INTERVAL, update.block_interval),
    ];
    for (key, value) in numeric {
        if value > 0 {
            params.push(KeyValuePair::new(key, value.to_string()));
        }
    }
    system_payload(
        chain_id,
        system_contract::CHAIN_CONFIG,
        config_method::BLOCK_UPDATE,
        params,
        update.sequence + 1,
    )
}

/// The policy is carried as JSON under the resource name.
pub fn permission_update(
    chain_id: &str,
    sequence: u64,
    resource_name: &str,
    policy: &LedgerPolicy,
) -> Result<Payload, serde_json::Error> {
    let encoded = serde_json::to_vec(policy)?;
    Ok(system_payload(
        chain_id,
        system_contract::CHAIN_CONFIG,
        config_method::PERMISSION_UPDATE,
        vec![KeyValuePair::new(resource_name, encoded)],
        sequence + 1,
    ))
}
