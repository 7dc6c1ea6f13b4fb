//! Transactions, payloads and submission results.

use serde::{Deserialize, Serialize};

use crate::block::Member;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxType {
    InvokeContract,
    QueryContract,
    SubscribeEvent,
    ArchiveBlock,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvokeContract => "INVOKE_CONTRACT",
            Self::QueryContract => "QUERY_CONTRACT",
            Self::SubscribeEvent => "SUBSCRIBE",
            Self::ArchiveBlock => "ARCHIVE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    pub key: String,
    pub value: Vec<u8>,
}

impl KeyValuePair {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The signed part of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub chain_id: String,
    pub tx_type: TxType,
    pub tx_id: String,
    pub timestamp: i64,
    pub contract_name: String,
    pub method: String,
    pub parameters: Vec<KeyValuePair>,
    /// Configuration sequence, only set for chain configuration updates.
    pub sequence: u64,
}

impl Payload {
    pub fn parameter(&self, key: &str) -> Option<&[u8]> {
        self.parameters
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| kv.value.as_slice())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsementEntry {
    pub signer: Member,
    pub signature: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatusCode {
    Success,
    Timeout,
    InvalidParameter,
    NoPermission,
    ContractFail,
    InternalError,
}

impl TxStatusCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Timeout => "TIMEOUT",
            Self::InvalidParameter => "INVALID_PARAMETER",
            Self::NoPermission => "NO_PERMISSION",
            Self::ContractFail => "CONTRACT_FAIL",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractResult {
    /// Zero on success.
    pub code: u32,
    pub result: Vec<u8>,
    pub message: String,
    pub gas_used: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    pub code: TxStatusCode,
    pub message: String,
    pub rw_set_hash: Vec<u8>,
    pub contract_result: Option<ContractResult>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub payload: Payload,
    pub sender: Option<EndorsementEntry>,
    pub endorsers: Vec<EndorsementEntry>,
    pub result: Option<TxResult>,
}

/// Node response to a submitted request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResponse {
    pub code: TxStatusCode,
    pub message: String,
    pub tx_id: String,
    pub contract_result: Option<ContractResult>,
}

impl TxResponse {
    /// Accepted by the node and, when a contract result is present, executed
    /// without error.
    pub fn succeeded(&self) -> bool {
        self.code == TxStatusCode::Success
            && self.contract_result.as_ref().map_or(true, |r| r.code == 0)
    }
}

/// A certificate registered on chain, looked up by hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertInfo {
    pub hash: String,
    pub cert: Vec<u8>,
}
