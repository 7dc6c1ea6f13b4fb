//! Registry of subscribed chains.
//!
//! Lookups read a `std::sync::RwLock`-guarded map and never wait on I/O.
//! Subscribe and unsubscribe are serialized by a separate async creation
//! lock, so a chain never has two live connections.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chainops_client::ClientFactory;
use chainops_governance::{ChainDirectory, ChainHandle};
use chainops_store::{Store, StoreError};
use chainops_types::{ChainStatus, Credentials};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::connection::{ChainConnection, ConnectionSettings};
use crate::metadata::refresh_metadata;
use crate::metrics::NodeMetrics;
use crate::NodeError;

pub struct ConnectionRegistry {
    factory: Arc<dyn ClientFactory>,
    store: Arc<dyn Store>,
    metrics: Arc<NodeMetrics>,
    settings: ConnectionSettings,
    connections: RwLock<HashMap<String, Arc<ChainConnection>>>,
    creation: Mutex<()>,
}

impl ConnectionRegistry {
    pub fn new(
        factory: Arc<dyn ClientFactory>,
        store: Arc<dyn Store>,
        metrics: Arc<NodeMetrics>,
        settings: ConnectionSettings,
    ) -> Self {
        Self {
            factory,
            store,
            metrics,
            settings,
            connections: RwLock::new(HashMap::new()),
            creation: Mutex::new(()),
        }
    }

    /// Connect to a chain, load its metadata and start mirroring it.
    ///
    /// An existing connection for the same chain is replaced only once the
    /// new client has answered and its metadata is mirrored; until then a
    /// failure leaves the running connection in place.
    pub async fn subscribe(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<ChainConnection>, NodeError> {
        let chain_id = credentials.chain_id.as_str();
        let _creation = self.creation.lock().await;

        let client = self
            .factory
            .connect(credentials)
            .await
            .map_err(|e| NodeError::from_subscribe(chain_id, e))?;
        client
            .get_chain_config()
            .await
            .map_err(|e| NodeError::from_subscribe(chain_id, e))?;
        refresh_metadata(&*self.store, &*client)
            .await
            .map_err(|e| match e {
                NodeError::Client(e) => NodeError::from_subscribe(chain_id, e),
                other => other,
            })?;

        if let Some(previous) = self.remove(chain_id) {
            info!(chain = %chain_id, "replacing existing subscription");
            previous.stop().await;
        }
        self.store
            .set_chain_status(chain_id, ChainStatus::Working)?;

        let connection = ChainConnection::start(
            credentials.org_id.clone(),
            client,
            Arc::clone(&self.store),
            Arc::clone(&self.metrics),
            self.settings,
        );
        let count = {
            let mut connections = self.write();
            connections.insert(chain_id.to_string(), Arc::clone(&connection));
            connections.len()
        };
        self.metrics.active_subscriptions.set(count as i64);
        info!(chain = %chain_id, org = %credentials.org_id, "chain subscribed");
        Ok(connection)
    }

    pub fn lookup(&self, chain_id: &str) -> Option<Arc<ChainConnection>> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(chain_id)
            .cloned()
    }

    pub fn chain_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Stop mirroring a chain. Returns `false` if it was not subscribed.
    pub async fn unsubscribe(&self, chain_id: &str) -> Result<bool, NodeError> {
        let _creation = self.creation.lock().await;
        let Some(connection) = self.remove(chain_id) else {
            return Ok(false);
        };
        connection.stop().await;
        match self.store.set_chain_status(chain_id, ChainStatus::NoWork) {
            Ok(()) | Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
        info!(chain = %chain_id, "chain unsubscribed");
        Ok(true)
    }

    /// Unsubscribe every chain.
    pub async fn shutdown(&self) {
        for chain_id in self.chain_ids() {
            if let Err(e) = self.unsubscribe(&chain_id).await {
                warn!(chain = %chain_id, error = %e, "unsubscribe failed during shutdown");
            }
        }
    }

    fn remove(&self, chain_id: &str) -> Option<Arc<ChainConnection>> {
        let mut connections = self.write();
        let removed = connections.remove(chain_id);
        self.metrics
            .active_subscriptions
            .set(connections.len() as i64);
        removed
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<ChainConnection>>> {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ChainDirectory for ConnectionRegistry {
    fn lookup(&self, chain_id: &str) -> Option<ChainHandle> {
        ConnectionRegistry::lookup(self, chain_id).map(|connection| ChainHandle {
            client: connection.client(),
            org_id: connection.org_id().to_string(),
        })
    }
}
