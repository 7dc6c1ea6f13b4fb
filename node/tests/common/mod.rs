#![allow(dead_code)]

use std::time::Duration;

use chainops_client::{
    Block, BlockInfo, ChainConfig, ContractResult, EndorsementEntry, KeyValuePair, LedgerPolicy,
    Member, MemberType, Payload, ResourcePolicy, Transaction, TrustRoot, TxResult, TxStatusCode,
    TxType,
};
use chainops_types::Credentials;
use rcgen::{Certificate, CertificateParams, DistinguishedName, DnType};

pub const CHAIN: &str = "c1";
pub const ORGS: [&str; 4] = ["org1", "org2", "org3", "org4"];

pub fn chain_config(sequence: u64) -> ChainConfig {
    let mut config = ChainConfig {
        chain_id: CHAIN.into(),
        version: "2.3.0".into(),
        sequence,
        consensus: "TBFT".into(),
        trust_roots: ORGS
            .iter()
            .map(|org| TrustRoot {
                org_id: org.to_string(),
                root: vec![format!("{org}-ca")],
            })
            .collect(),
        ..Default::default()
    };
    config.block.block_tx_capacity = 100;
    config.block.block_interval = 2000;
    config.block.tx_timeout = 600;
    config.block.tx_timestamp_verify = true;
    config
}

/// `config` with an explicit rule for one resource.
pub fn with_policy(mut config: ChainConfig, resource: &str, rule: &str) -> ChainConfig {
    config.resource_policies.push(ResourcePolicy {
        resource_name: resource.into(),
        policy: LedgerPolicy {
            rule: rule.into(),
            org_list: Vec::new(),
            role_list: vec!["ADMIN".into()],
        },
    });
    config
}

pub fn credentials(chain_id: &str, org_id: &str) -> Credentials {
    Credentials {
        chain_id: chain_id.into(),
        org_id: org_id.into(),
        user_name: "admin1".into(),
        node_addr: "127.0.0.1:12301".into(),
        tls: false,
        tls_host: String::new(),
        ca_cert: Vec::new(),
        user_cert: Vec::new(),
        user_key: Vec::new(),
    }
}

pub fn cert_pem(cn: &str) -> Vec<u8> {
    let mut params = CertificateParams::new(vec![]);
    params.distinguished_name = DistinguishedName::new();
    params.distinguished_name.push(DnType::CommonName, cn);
    Certificate::from_params(params)
        .unwrap()
        .serialize_pem()
        .unwrap()
        .into_bytes()
}

pub fn member(org_id: &str, member_type: MemberType, member_info: Vec<u8>) -> Member {
    Member {
        org_id: org_id.into(),
        member_type,
        member_info,
    }
}

pub fn endorsement(signer: Member) -> EndorsementEntry {
    EndorsementEntry {
        signer,
        signature: b"sig".to_vec(),
    }
}

pub fn tx(tx_id: &str, contract: &str, method: &str, params: &[(&str, &[u8])]) -> Transaction {
    Transaction {
        payload: Payload {
            chain_id: CHAIN.into(),
            tx_type: TxType::InvokeContract,
            tx_id: tx_id.into(),
            timestamp: 1_700_000_100,
            contract_name: contract.into(),
            method: method.into(),
            parameters: params
                .iter()
                .map(|(key, value)| KeyValuePair::new(*key, *value))
                .collect(),
            sequence: 0,
        },
        sender: Some(endorsement(member(
            "org1",
            MemberType::Alias,
            b"admin1".to_vec(),
        ))),
        endorsers: Vec::new(),
        result: Some(tx_result(0)),
    }
}

pub fn tx_result(contract_code: u32) -> TxResult {
    TxResult {
        code: TxStatusCode::Success,
        message: "OK".into(),
        rw_set_hash: vec![0xee],
        contract_result: Some(ContractResult {
            code: contract_code,
            result: b"ok".to_vec(),
            message: String::new(),
            gas_used: 12,
        }),
    }
}

pub fn block_at(height: u64, txs: Vec<Transaction>) -> BlockInfo {
    let mut block = Block::default();
    block.header.chain_id = CHAIN.into();
    block.header.block_height = height;
    block.header.block_hash = height.to_be_bytes().to_vec();
    block.header.pre_block_hash = height.saturating_sub(1).to_be_bytes().to_vec();
    block.header.block_timestamp = 1_700_000_000 + height as i64;
    block.header.tx_count = txs.len() as u32;
    block.header.proposer = Some(member("org1", MemberType::Alias, b"consensus1".to_vec()));
    block.txs = txs;
    BlockInfo { block }
}

/// Poll `check` until it holds or five seconds pass.
pub async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
