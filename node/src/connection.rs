//! A live subscription to one chain: a metadata refresh loop and a block
//! listener loop sharing one connection lock and one stop handle.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chainops_client::{BlockInfo, BlockStream, ChainClient};
use chainops_store::Store;
use chainops_types::ChainStatus;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use crate::ingest::BlockIngestor;
use crate::metadata::refresh_metadata;
use crate::metrics::NodeMetrics;
use crate::shutdown::{StopHandle, StopSignal};
use crate::tracing_spans::{metadata_refresh_span, subscription_span};
use crate::worker_pool::WorkerPool;
use crate::NodeError;

/// Loop parameters shared by every connection of a registry.
#[derive(Clone, Copy, Debug)]
pub struct ConnectionSettings {
    pub refresh_interval: Duration,
    pub ingest_workers: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60),
            ingest_workers: 1,
        }
    }
}

/// Why the block listener stopped.
#[derive(Debug)]
enum ListenerExit {
    Stopped,
    Closed,
    Failed(String),
}

pub struct ChainConnection {
    chain_id: String,
    org_id: String,
    client: Arc<dyn ChainClient>,
    stop: StopHandle,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for ChainConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConnection")
            .field("chain_id", &self.chain_id)
            .field("org_id", &self.org_id)
            .finish_non_exhaustive()
    }
}

struct LoopContext {
    chain_id: String,
    client: Arc<dyn ChainClient>,
    store: Arc<dyn Store>,
    metrics: Arc<NodeMetrics>,
    /// Serializes metadata refreshes with (re)subscription.
    lock: tokio::sync::Mutex<()>,
    settings: ConnectionSettings,
}

impl ChainConnection {
    /// Spawn both loops for an already verified client.
    pub fn start(
        org_id: impl Into<String>,
        client: Arc<dyn ChainClient>,
        store: Arc<dyn Store>,
        metrics: Arc<NodeMetrics>,
        settings: ConnectionSettings,
    ) -> Arc<Self> {
        let chain_id = client.chain_id().to_string();
        let stop = StopHandle::new();
        let ctx = Arc::new(LoopContext {
            chain_id: chain_id.clone(),
            client: Arc::clone(&client),
            store,
            metrics,
            lock: tokio::sync::Mutex::new(()),
            settings,
        });

        let refresh = tokio::spawn(
            refresh_loop(Arc::clone(&ctx), stop.signal()).instrument(subscription_span(&chain_id)),
        );
        let listener =
            tokio::spawn(listen_loop(ctx, stop.signal()).instrument(subscription_span(&chain_id)));

        Arc::new(Self {
            chain_id,
            org_id: org_id.into(),
            client,
            stop,
            tasks: Mutex::new(vec![refresh, listener]),
        })
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn client(&self) -> Arc<dyn ChainClient> {
        Arc::clone(&self.client)
    }

    /// Whether either loop is still running.
    pub fn is_running(&self) -> bool {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|task| !task.is_finished())
    }

    /// Signal both loops and wait until they have exited.
    ///
    /// A metadata refresh or block waiting on the node is abandoned rather
    /// than awaited, so this returns even when the node has gone silent.
    /// Blocks that were received but not yet written are fetched again on
    /// the next subscription.
    pub async fn stop(&self) {
        self.stop.stop();
        let tasks = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        for task in tasks {
            if let Err(e) = task.await {
                error!(chain = %self.chain_id, error = %e, "connection task panicked");
            }
        }
        debug!(chain = %self.chain_id, "connection stopped");
    }
}

async fn refresh_loop(ctx: Arc<LoopContext>, mut stop: StopSignal) {
    let period = ctx.settings.refresh_interval;
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = stop.stopped() => break,
            _ = interval.tick() => {}
        }

        // A refresh cut short leaves a mix of old and new rows; the next
        // subscription rewrites all of them.
        let refresh = async {
            let _guard = ctx.lock.lock().await;
            refresh_metadata(&*ctx.store, &*ctx.client)
                .instrument(metadata_refresh_span(&ctx.chain_id))
                .await
        };
        let result = tokio::select! {
            biased;
            _ = stop.stopped() => {
                debug!(chain = %ctx.chain_id, "metadata refresh abandoned");
                break;
            }
            result = refresh => result,
        };
        match result {
            Ok(report) => debug!(
                chain = %ctx.chain_id,
                orgs = report.orgs,
                nodes = ?report.nodes,
                policies = report.policies,
                "metadata refreshed"
            ),
            Err(e) => {
                ctx.metrics.refresh_failures.inc();
                warn!(chain = %ctx.chain_id, error = %e, "metadata refresh failed");
            }
        }
    }
    debug!(chain = %ctx.chain_id, "refresh loop exited");
}

async fn listen_loop(ctx: Arc<LoopContext>, mut stop: StopSignal) {
    let stream = tokio::select! {
        biased;
        _ = stop.stopped() => return,
        stream = open_stream(&ctx) => stream,
    };
    let mut stream = match stream {
        Ok(stream) => stream,
        Err(reason) => {
            warn!(chain = %ctx.chain_id, error = %reason, "block subscription failed");
            mark_no_work(&ctx);
            return;
        }
    };

    let pool = WorkerPool::new(
        format!("ingest-{}", ctx.chain_id),
        ctx.settings.ingest_workers,
    );
    let ingestor = Arc::new(BlockIngestor::new(
        Arc::clone(&ctx.store),
        Arc::clone(&ctx.client),
        Arc::clone(&ctx.metrics),
    ));

    let task_signal = stop.clone();
    let exit = loop {
        tokio::select! {
            biased;
            _ = stop.stopped() => break ListenerExit::Stopped,
            item = stream.recv() => match item {
                Some(Ok(block)) => {
                    let height = block.height();
                    let ingestor = Arc::clone(&ingestor);
                    let submitted = pool.submit(
                        format!("block {height}"),
                        ingest_unless_stopped(ingestor, block, task_signal.clone()),
                    );
                    if let Err(e) = submitted {
                        break ListenerExit::Failed(e.to_string());
                    }
                }
                Some(Err(e)) => break ListenerExit::Failed(e.to_string()),
                None => break ListenerExit::Closed,
            }
        }
    };

    pool.close_and_drain().await;
    match exit {
        ListenerExit::Stopped => debug!(chain = %ctx.chain_id, "listener stopped"),
        ListenerExit::Closed => {
            info!(chain = %ctx.chain_id, "block stream closed");
            mark_no_work(&ctx);
        }
        ListenerExit::Failed(reason) => {
            warn!(chain = %ctx.chain_id, error = %reason, "block stream failed");
            mark_no_work(&ctx);
        }
    }
}

/// Apply one block unless the connection is stopping.
///
/// Every await in ingestion precedes the single store write, so a block
/// abandoned here leaves nothing behind and is delivered again by the next
/// subscription, which starts below the mirrored tip.
async fn ingest_unless_stopped(
    ingestor: Arc<BlockIngestor>,
    block: BlockInfo,
    mut stop: StopSignal,
) -> Result<(), NodeError> {
    let height = block.height();
    if stop.is_stopped() {
        debug!(height, "skipping queued block, connection stopping");
        return Ok(());
    }
    tokio::select! {
        biased;
        result = ingestor.ingest(block) => result.map(|_| ()),
        _ = stop.stopped() => {
            debug!(height, "block ingestion abandoned, connection stopping");
            Ok(())
        }
    }
}

/// Subscribe from one block below the local tip so a block that was being
/// applied when the previous stream ended is delivered again.
async fn open_stream(ctx: &LoopContext) -> Result<BlockStream, String> {
    let _guard = ctx.lock.lock().await;
    let start = ctx
        .store
        .max_block_height(&ctx.chain_id)
        .map_err(|e| e.to_string())?
        .map_or(0, |height| height.saturating_sub(1));
    info!(chain = %ctx.chain_id, start, "subscribing to blocks");
    ctx.client
        .subscribe_block(start, None, true, false)
        .await
        .map_err(|e| e.to_string())
}

fn mark_no_work(ctx: &LoopContext) {
    if let Err(e) = ctx.store.set_chain_status(&ctx.chain_id, ChainStatus::NoWork) {
        warn!(chain = %ctx.chain_id, error = %e, "cannot update chain status");
    }
}
