//! The management node: storage, chain connections and the governance
//! workflow wired together behind one service object.

use std::sync::Arc;

use chainops_client::{ClientFactory, PayloadSigner};
use chainops_governance::{
    ChainDirectory, GovernanceError, GovernanceWorkflow, GovernedAction, VoteOutcome,
};
use chainops_store::{Store, StoreError};
use chainops_store_lmdb::{environment::DATABASE_COUNT, LmdbEnvironment};
use chainops_types::{Ballot, Clock, Credentials, DispatchOutcome, Proposal, SystemClock};
use tracing::{info, Instrument};

use crate::config::NodeConfig;
use crate::connection::{ChainConnection, ConnectionSettings};
use crate::metrics::NodeMetrics;
use crate::registry::ConnectionRegistry;
use crate::tracing_spans::vote_span;
use crate::NodeError;

pub struct ManagementNode {
    config: NodeConfig,
    store: Arc<dyn Store>,
    metrics: Arc<NodeMetrics>,
    registry: Arc<ConnectionRegistry>,
    governance: GovernanceWorkflow,
}

impl ManagementNode {
    pub fn new(
        config: NodeConfig,
        store: Arc<dyn Store>,
        factory: Arc<dyn ClientFactory>,
        signer: Arc<dyn PayloadSigner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let metrics = Arc::new(NodeMetrics::new());
        let settings = ConnectionSettings {
            refresh_interval: config.refresh_interval(),
            ingest_workers: config.ingest_workers,
        };
        let registry = Arc::new(ConnectionRegistry::new(
            factory,
            Arc::clone(&store),
            Arc::clone(&metrics),
            settings,
        ));
        let governance = GovernanceWorkflow::new(
            Arc::clone(&store),
            Arc::clone(&registry) as Arc<dyn ChainDirectory>,
            signer,
            clock,
        )
        .with_tx_timeout(config.tx_timeout());
        Self {
            config,
            store,
            metrics,
            registry,
            governance,
        }
    }

    /// Open the LMDB mirror under `config.data_dir` and build the node on it.
    pub fn open(
        config: NodeConfig,
        factory: Arc<dyn ClientFactory>,
        signer: Arc<dyn PayloadSigner>,
    ) -> Result<Self, NodeError> {
        let env = LmdbEnvironment::open(&config.data_dir, DATABASE_COUNT, config.map_size)
            .map_err(StoreError::from)?;
        info!(path = %config.data_dir.display(), "mirror database opened");
        Ok(Self::new(
            config,
            Arc::new(env),
            factory,
            signer,
            Arc::new(SystemClock),
        ))
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<NodeMetrics> {
        &self.metrics
    }

    /// Prometheus text export, or `None` when metrics are disabled.
    pub fn export_metrics(&self) -> Result<Option<String>, NodeError> {
        if !self.config.enable_metrics {
            return Ok(None);
        }
        self.metrics.encode_text().map(Some)
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn governance(&self) -> &GovernanceWorkflow {
        &self.governance
    }

    pub async fn subscribe(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<ChainConnection>, NodeError> {
        self.registry.subscribe(credentials).await
    }

    pub async fn unsubscribe(&self, chain_id: &str) -> Result<bool, NodeError> {
        self.registry.unsubscribe(chain_id).await
    }

    pub async fn propose(
        &self,
        chain_id: &str,
        action: GovernedAction,
        reason: &str,
    ) -> Result<Proposal, NodeError> {
        let proposal = self.governance.propose(chain_id, action, reason).await?;
        self.metrics.proposals_created.inc();
        Ok(proposal)
    }

    pub async fn vote(
        &self,
        multi_id: &str,
        org_id: &str,
        approve: bool,
    ) -> Result<VoteOutcome, NodeError> {
        let result = self
            .governance
            .vote(multi_id, org_id, approve)
            .instrument(vote_span(multi_id, org_id))
            .await;
        match &result {
            Ok(outcome) => {
                self.metrics.votes_recorded.inc();
                match outcome {
                    VoteOutcome::Dispatched(DispatchOutcome::Succeeded { .. }) => {
                        self.metrics.dispatch_successes.inc()
                    }
                    VoteOutcome::Dispatched(DispatchOutcome::Unchanged) => {
                        self.metrics.dispatch_unchanged.inc()
                    }
                    VoteOutcome::Dispatched(DispatchOutcome::Failed { .. }) => {
                        self.metrics.dispatch_failures.inc()
                    }
                    VoteOutcome::Pending { .. } | VoteOutcome::Settled => {}
                }
            }
            Err(GovernanceError::Dispatch { .. }) => {
                self.metrics.votes_recorded.inc();
                self.metrics.dispatch_failures.inc();
            }
            Err(_) => {}
        }
        Ok(result?)
    }

    pub fn proposal(&self, multi_id: &str) -> Result<Proposal, NodeError> {
        Ok(self.governance.proposal(multi_id)?)
    }

    pub fn ballots(&self, multi_id: &str) -> Result<Vec<Ballot>, NodeError> {
        Ok(self.governance.ballots(multi_id)?)
    }

    pub fn proposals(&self, chain_id: &str) -> Result<Vec<Proposal>, NodeError> {
        Ok(self.governance.proposals(chain_id)?)
    }

    /// Stop every chain connection. Accepted blocks are persisted first.
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
        info!("management node stopped");
    }
}
