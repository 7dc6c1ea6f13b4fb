//! Nullable ledger client: scripted responses, recorded submissions.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chainops_client::{
    BlockInfo, BlockStream, CertInfo, ChainClient, ChainConfig, ClientError, ClientErrorKind,
    ClientFactory, EndorsementEntry, NodeTopology, Payload, TxResponse, TxStatusCode,
};
use chainops_types::Credentials;
use tokio::sync::mpsc;

const STREAM_CAPACITY: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionKind {
    ContractManage,
    ChainConfigUpdate,
}

/// A request the engine sent to the ledger.
#[derive(Clone, Debug)]
pub struct Submission {
    pub kind: SubmissionKind,
    pub payload: Payload,
    pub endorsements: Vec<EndorsementEntry>,
}

/// A scriptable [`ChainClient`].
///
/// Blocks pushed before anyone subscribes are buffered and replayed from the
/// requested start height on the next subscription.
pub struct NullChainClient {
    chain_id: String,
    config: Mutex<ChainConfig>,
    topology: Mutex<NodeTopology>,
    certs: Mutex<HashMap<String, Vec<u8>>>,
    config_error: Mutex<Option<ClientError>>,
    config_script: Mutex<VecDeque<Result<ChainConfig, ClientError>>>,
    config_stalled: AtomicBool,
    topology_error: Mutex<Option<ClientError>>,
    subscribe_error: Mutex<Option<ClientError>>,
    feed: Mutex<Option<mpsc::Sender<Result<BlockInfo, ClientError>>>>,
    backlog: Mutex<Vec<BlockInfo>>,
    subscriptions: Mutex<Vec<u64>>,
    responses: Mutex<VecDeque<Result<TxResponse, ClientError>>>,
    submit_delay: Mutex<Option<Duration>>,
    submissions: Mutex<Vec<Submission>>,
    config_calls: AtomicUsize,
}

impl NullChainClient {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            chain_id: config.chain_id.clone(),
            config: Mutex::new(config),
            topology: Mutex::new(NodeTopology::default()),
            certs: Mutex::new(HashMap::new()),
            config_error: Mutex::new(None),
            config_script: Mutex::new(VecDeque::new()),
            config_stalled: AtomicBool::new(false),
            topology_error: Mutex::new(None),
            subscribe_error: Mutex::new(None),
            feed: Mutex::new(None),
            backlog: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            submit_delay: Mutex::new(None),
            submissions: Mutex::new(Vec::new()),
            config_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_config(&self, config: ChainConfig) {
        *self.config.lock().unwrap() = config;
    }

    pub fn set_topology(&self, topology: NodeTopology) {
        *self.topology.lock().unwrap() = topology;
    }

    /// Register a certificate resolvable through `query_cert`.
    pub fn add_cert(&self, hash: &str, cert: Vec<u8>) {
        self.certs.lock().unwrap().insert(hash.to_string(), cert);
    }

    pub fn fail_config(&self, error: Option<ClientError>) {
        *self.config_error.lock().unwrap() = error;
    }

    /// Script the result of the next `get_chain_config` call. Scripted
    /// results are used up before the standing config or error applies.
    pub fn queue_config(&self, result: Result<ChainConfig, ClientError>) {
        self.config_script.lock().unwrap().push_back(result);
    }

    /// While set, `get_chain_config` never answers, like a node that
    /// accepted the request and went silent.
    pub fn stall_config(&self, stalled: bool) {
        self.config_stalled.store(stalled, Ordering::SeqCst);
    }

    pub fn fail_topology(&self, error: Option<ClientError>) {
        *self.topology_error.lock().unwrap() = error;
    }

    pub fn fail_subscribe(&self, error: Option<ClientError>) {
        *self.subscribe_error.lock().unwrap() = error;
    }

    /// Deliver a block to the live subscription, or buffer it.
    pub fn push_block(&self, block: BlockInfo) {
        let feed = self.feed.lock().unwrap();
        match feed.as_ref() {
            Some(tx) if tx.try_send(Ok(block.clone())).is_ok() => {}
            _ => self.backlog.lock().unwrap().push(block),
        }
    }

    /// Deliver a malformed item to the live subscription.
    pub fn push_stream_error(&self, error: ClientError) {
        if let Some(tx) = self.feed.lock().unwrap().as_ref() {
            let _ = tx.try_send(Err(error));
        }
    }

    /// End the live subscription.
    pub fn close_stream(&self) {
        self.feed.lock().unwrap().take();
    }

    pub fn has_live_stream(&self) -> bool {
        self.feed
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Start heights of every subscription, in order.
    pub fn subscriptions(&self) -> Vec<u64> {
        self.subscriptions.lock().unwrap().clone()
    }

    /// Queue the result of the next submission. Unqueued submissions succeed.
    pub fn queue_response(&self, response: Result<TxResponse, ClientError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn delay_submissions(&self, delay: Duration) {
        *self.submit_delay.lock().unwrap() = Some(delay);
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn config_calls(&self) -> usize {
        self.config_calls.load(Ordering::SeqCst)
    }

    pub fn success_response(tx_id: &str) -> TxResponse {
        TxResponse {
            code: TxStatusCode::Success,
            message: "OK".into(),
            tx_id: tx_id.to_string(),
            contract_result: Some(chainops_client::ContractResult::default()),
        }
    }

    async fn submit(
        &self,
        kind: SubmissionKind,
        payload: Payload,
        endorsements: Vec<EndorsementEntry>,
    ) -> Result<TxResponse, ClientError> {
        let delay = *self.submit_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let tx_id = payload.tx_id.clone();
        self.submissions.lock().unwrap().push(Submission {
            kind,
            payload,
            endorsements,
        });
        let scripted = self.responses.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(Self::success_response(&tx_id)))
    }
}

#[async_trait]
impl ChainClient for NullChainClient {
    fn chain_id(&self) -> &str {
        &self.chain_id
    }

    async fn get_chain_config(&self) -> Result<ChainConfig, ClientError> {
        self.config_calls.fetch_add(1, Ordering::SeqCst);
        if self.config_stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let scripted = self.config_script.lock().unwrap().pop_front();
        if let Some(result) = scripted {
            return result;
        }
        if let Some(err) = self.config_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.config.lock().unwrap().clone())
    }

    async fn get_chain_info(&self) -> Result<NodeTopology, ClientError> {
        if let Some(err) = self.topology_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.topology.lock().unwrap().clone())
    }

    async fn subscribe_block(
        &self,
        start: u64,
        _end: Option<u64>,
        _with_rw_set: bool,
        _only_header: bool,
    ) -> Result<BlockStream, ClientError> {
        if let Some(err) = self.subscribe_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.subscriptions.lock().unwrap().push(start);
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        let mut feed = self.feed.lock().unwrap();
        let mut backlog = std::mem::take(&mut *self.backlog.lock().unwrap());
        backlog.sort_by_key(BlockInfo::height);
        for block in backlog.into_iter().filter(|b| b.height() >= start) {
            let _ = tx.try_send(Ok(block));
        }
        *feed = Some(tx);
        Ok(rx)
    }

    async fn query_cert(&self, cert_hashes: &[String]) -> Result<Vec<CertInfo>, ClientError> {
        let certs = self.certs.lock().unwrap();
        Ok(cert_hashes
            .iter()
            .filter_map(|hash| {
                certs.get(hash).map(|cert| CertInfo {
                    hash: hash.clone(),
                    cert: cert.clone(),
                })
            })
            .collect())
    }

    async fn send_contract_manage_request(
        &self,
        payload: Payload,
        endorsements: Vec<EndorsementEntry>,
        _timeout: Duration,
        _with_sync_result: bool,
    ) -> Result<TxResponse, ClientError> {
        self.submit(SubmissionKind::ContractManage, payload, endorsements)
            .await
    }

    async fn send_chain_config_update_request(
        &self,
        payload: Payload,
        endorsements: Vec<EndorsementEntry>,
        _timeout: Duration,
        _with_sync_result: bool,
    ) -> Result<TxResponse, ClientError> {
        self.submit(SubmissionKind::ChainConfigUpdate, payload, endorsements)
            .await
    }
}

/// Hands out pre-registered [`NullChainClient`]s by chain id.
#[derive(Default)]
pub struct NullClientFactory {
    clients: Mutex<HashMap<String, Arc<NullChainClient>>>,
    connect_error: Mutex<Option<ClientError>>,
    connects: AtomicUsize,
}

impl NullClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, client: Arc<NullChainClient>) {
        self.clients
            .lock()
            .unwrap()
            .insert(client.chain_id.clone(), client);
    }

    /// Make every connect fail until cleared.
    pub fn fail_connect(&self, error: Option<ClientError>) {
        *self.connect_error.lock().unwrap() = error;
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientFactory for NullClientFactory {
    async fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn ChainClient>, ClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.connect_error.lock().unwrap().clone() {
            return Err(err);
        }
        let client = self
            .clients
            .lock()
            .unwrap()
            .get(&credentials.chain_id)
            .cloned()
            .ok_or_else(|| {
                ClientError::new(
                    ClientErrorKind::ChainNotFound,
                    format!("chain {} not found", credentials.chain_id),
                )
            })?;
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainops_client::Block;

    fn block_at(height: u64) -> BlockInfo {
        let mut info = BlockInfo {
            block: Block::default(),
        };
        info.block.header.block_height = height;
        info
    }

    fn client() -> NullChainClient {
        NullChainClient::new(ChainConfig {
            chain_id: "chain1".into(),
            ..ChainConfig::default()
        })
    }

    #[tokio::test]
    async fn backlog_replays_from_start_height() {
        let client = client();
        for h in [3, 1, 2] {
            client.push_block(block_at(h));
        }
        let mut rx = client.subscribe_block(2, None, true, false).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().unwrap().height(), 2);
        assert_eq!(rx.recv().await.unwrap().unwrap().height(), 3);

        client.push_block(block_at(4));
        assert_eq!(rx.recv().await.unwrap().unwrap().height(), 4);

        client.close_stream();
        assert!(rx.recv().await.is_none());
        assert_eq!(client.subscriptions(), vec![2]);
    }

    #[tokio::test]
    async fn submissions_use_queued_responses_then_succeed() {
        let client = client();
        client.queue_response(Err(ClientError::new(ClientErrorKind::Timeout, "slow")));
        let payload = client.create_contract_freeze_payload("asset");

        let first = client
            .send_contract_manage_request(payload.clone(), vec![], Duration::from_secs(1), true)
            .await;
        assert_eq!(first.unwrap_err().kind, ClientErrorKind::Timeout);
        let second = client
            .send_contract_manage_request(payload, vec![], Duration::from_secs(1), true)
            .await
            .unwrap();
        assert!(second.succeeded());
        assert_eq!(client.submissions().len(), 2);
    }

    #[tokio::test]
    async fn scripted_config_results_come_first() {
        let client = client();
        client.queue_config(Err(ClientError::new(ClientErrorKind::Connectivity, "down")));
        assert!(client.get_chain_config().await.is_err());
        assert_eq!(client.get_chain_config().await.unwrap().chain_id, "chain1");

        client.stall_config(true);
        let stalled =
            tokio::time::timeout(Duration::from_millis(50), client.get_chain_config()).await;
        assert!(stalled.is_err());
        assert_eq!(client.config_calls(), 3);
    }

    #[tokio::test]
    async fn factory_reports_unknown_chain() {
        let factory = NullClientFactory::new();
        let creds = Credentials {
            chain_id: "missing".into(),
            org_id: "org1".into(),
            user_name: "admin1".into(),
            node_addr: "127.0.0.1:12301".into(),
            tls: false,
            tls_host: String::new(),
            ca_cert: Vec::new(),
            user_cert: Vec::new(),
            user_key: Vec::new(),
        };
        let err = factory.connect(&creds).await.err().unwrap();
        assert_eq!(err.kind, ClientErrorKind::ChainNotFound);
    }
}
