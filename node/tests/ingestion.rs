mod common;

use std::sync::Arc;

use chainops_client::payload::{param_key, system_contract};
use chainops_client::MemberType;
use chainops_node::{BlockIngestor, NodeMetrics};
use chainops_nullables::{NullChainClient, NullStore};
use chainops_store::{ChainStore, ContractStore, InsertOutcome, LedgerStore, PolicyStore};
use chainops_types::{
    Chain, ChainStatus, ContractStatus, MultiSignStatus, PolicyRule, ResourceType, Timestamp,
};

use common::*;

struct Fixture {
    store: Arc<NullStore>,
    client: Arc<NullChainClient>,
    metrics: Arc<NodeMetrics>,
    ingestor: BlockIngestor,
}

fn fixture() -> Fixture {
    let store = Arc::new(NullStore::new());
    let client = Arc::new(NullChainClient::new(chain_config(1)));
    let metrics = Arc::new(NodeMetrics::new());
    let ingestor = BlockIngestor::new(store.clone(), client.clone(), metrics.clone());
    Fixture {
        store,
        client,
        metrics,
        ingestor,
    }
}

fn install_tx(tx_id: &str, contract_code: u32) -> chainops_client::Transaction {
    let mut tx = tx(
        tx_id,
        system_contract::CONTRACT_MANAGE,
        "INIT_CONTRACT",
        &[
            (param_key::CONTRACT_NAME, b"asset"),
            (param_key::CONTRACT_VERSION, b"1.0"),
            (param_key::CONTRACT_RUNTIME_TYPE, b"WASMER"),
            (param_key::CONTRACT_BYTECODE, b"\0asm"),
        ],
    );
    tx.result = Some(tx_result(contract_code));
    tx
}

#[tokio::test]
async fn redelivered_block_is_a_duplicate() {
    let f = fixture();
    let block = block_at(10, vec![tx("t1", "asset", "transfer", &[("to", b"bob")])]);

    let first = f.ingestor.ingest(block.clone()).await.unwrap();
    assert_eq!(first.outcome, InsertOutcome::Inserted);
    assert_eq!(first.transactions, 1);

    let second = f.ingestor.ingest(block).await.unwrap();
    assert_eq!(second.outcome, InsertOutcome::Duplicate);

    assert_eq!(f.store.list_blocks(CHAIN).unwrap().len(), 1);
    assert_eq!(f.store.transaction_count(CHAIN).unwrap(), 1);
    assert_eq!(f.metrics.blocks_ingested.get(), 1);
    assert_eq!(f.metrics.duplicate_blocks.get(), 1);
}

#[tokio::test]
async fn block_header_is_mirrored_hex_encoded() {
    let f = fixture();
    f.ingestor.ingest(block_at(7, Vec::new())).await.unwrap();

    let row = f.store.get_block(CHAIN, 7).unwrap();
    assert_eq!(row.block_hash, "0000000000000007");
    assert_eq!(row.pre_block_hash, "0000000000000006");
    assert_eq!(row.timestamp, Timestamp::new(1_700_000_007));
    assert_eq!(row.proposer_org, "org1");
    assert_eq!(row.proposer_id, "consensus1");
    assert_eq!(f.store.max_block_height(CHAIN).unwrap(), Some(7));
}

#[tokio::test]
async fn member_certificates_resolve_to_common_names() {
    let f = fixture();
    f.client.add_cert("abcd", cert_pem("client1.sign.org2"));

    let mut transfer = tx("t1", "asset", "transfer", &[("amount", b"5")]);
    transfer.sender = Some(endorsement(member(
        "org1",
        MemberType::Cert,
        cert_pem("admin1.sign.org1"),
    )));
    transfer.endorsers = vec![
        endorsement(member("org2", MemberType::CertHash, vec![0xab, 0xcd])),
        endorsement(member("org3", MemberType::CertHash, vec![0x99])),
    ];
    f.ingestor.ingest(block_at(3, vec![transfer])).await.unwrap();

    let row = f.store.get_transaction(CHAIN, "t1").unwrap();
    assert_eq!(row.sender_org, "org1");
    assert_eq!(row.sender, "admin1.sign.org1");
    assert_eq!(row.endorsers, ["org2/client1.sign.org2", "org3/"]);
    assert_eq!(row.contract_name, "asset");
    assert_eq!(row.method, "transfer");
    assert_eq!(row.parameters, r#"{"amount":"5"}"#);
    assert_eq!(row.result.code, "SUCCESS");
    assert_eq!(row.result.contract_code, Some(0));
    assert_eq!(row.result.gas_used, 12);
}

#[tokio::test]
async fn successful_install_creates_contract_row() {
    let f = fixture();
    let report = f
        .ingestor
        .ingest(block_at(5, vec![install_tx("t-init", 0)]))
        .await
        .unwrap();
    assert_eq!(report.contracts, 1);

    let contract = f.store.get_contract(CHAIN, "asset").unwrap().unwrap();
    assert_eq!(contract.status, ContractStatus::InitOk);
    assert_eq!(contract.multi_sign_status, MultiSignStatus::NoVoting);
    assert_eq!(contract.version, "1.0");
    assert_eq!(contract.runtime_type, "WASMER");
    assert_eq!(contract.org_id, "org1");
    assert_eq!(contract.tx_id.as_deref(), Some("t-init"));

    let row = f.store.get_transaction(CHAIN, "t-init").unwrap();
    assert_eq!(row.contract_name, "asset");
    assert_eq!(row.contract_version, "1.0");
    assert_eq!(
        row.parameters,
        r#"{"CONTRACT_NAME":"asset","CONTRACT_RUNTIME_TYPE":"WASMER","CONTRACT_VERSION":"1.0"}"#
    );
}

#[tokio::test]
async fn failed_install_leaves_contracts_untouched() {
    let f = fixture();
    let report = f
        .ingestor
        .ingest(block_at(5, vec![install_tx("t-init", 4)]))
        .await
        .unwrap();
    assert_eq!(report.contracts, 0);
    assert!(f.store.get_contract(CHAIN, "asset").unwrap().is_none());
    assert_eq!(f.store.transaction_count(CHAIN).unwrap(), 1);
}

#[tokio::test]
async fn freeze_in_same_block_as_install_wins() {
    let f = fixture();
    let freeze = tx(
        "t-freeze",
        system_contract::CONTRACT_MANAGE,
        "FREEZE_CONTRACT",
        &[(param_key::CONTRACT_NAME, b"asset")],
    );
    let report = f
        .ingestor
        .ingest(block_at(5, vec![install_tx("t-init", 0), freeze]))
        .await
        .unwrap();
    assert_eq!(report.contracts, 1);

    let contract = f.store.get_contract(CHAIN, "asset").unwrap().unwrap();
    assert_eq!(contract.status, ContractStatus::FreezeOk);
    assert_eq!(contract.version, "1.0");
    assert_eq!(contract.tx_id.as_deref(), Some("t-freeze"));
}

#[tokio::test]
async fn config_transaction_snapshots_and_applies_configuration() {
    let f = fixture();
    let mut chain = Chain::new(CHAIN, "chain one");
    chain.sequence = 1;
    chain.status = ChainStatus::NoWork;
    f.store.put_chain(&chain).unwrap();

    let mut updated = with_policy(chain_config(2), "CONTRACT_MANAGE-INIT_CONTRACT", "ANY");
    updated.block.block_tx_capacity = 500;
    f.client.set_config(updated);

    let change = tx(
        "t-cfg",
        system_contract::CHAIN_CONFIG,
        "BLOCK_UPDATE",
        &[(param_key::BLOCK_TX_CAPACITY, b"500")],
    );
    let report = f.ingestor.ingest(block_at(9, vec![change])).await.unwrap();
    assert!(report.config_changed);

    let snapshot = f
        .store
        .latest_config_record(CHAIN, Timestamp::new(u64::MAX))
        .unwrap()
        .unwrap();
    assert_eq!(snapshot.height, 9);
    let config: chainops_client::ChainConfig = serde_json::from_str(&snapshot.config).unwrap();
    assert_eq!(config.sequence, 2);

    let chain = f.store.get_chain(CHAIN).unwrap();
    assert_eq!(chain.sequence, 2);
    assert_eq!(chain.block_tx_capacity, 500);
    assert_eq!(chain.chain_name, "chain one");
    assert_eq!(chain.status, ChainStatus::NoWork);

    let policy = f
        .store
        .get_policy(CHAIN, ResourceType::InitContract)
        .unwrap()
        .unwrap();
    assert_eq!(policy.rule, PolicyRule::Any);
}

#[tokio::test]
async fn ordinary_block_does_not_fetch_configuration() {
    let f = fixture();
    f.ingestor
        .ingest(block_at(1, vec![tx("t1", "asset", "transfer", &[])]))
        .await
        .unwrap();
    assert_eq!(f.client.config_calls(), 0);
    assert!(f
        .store
        .latest_config_record(CHAIN, Timestamp::new(u64::MAX))
        .unwrap()
        .is_none());
}
