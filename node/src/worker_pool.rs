//! Fixed-size pool of async workers fed by one unbounded queue.
//!
//! With a single worker, tasks run strictly in submission order; the block
//! listener relies on this to apply a chain's blocks sequentially.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::NodeError;

type BoxedTask = Pin<Box<dyn Future<Output = Result<(), NodeError>> + Send>>;

struct Job {
    name: String,
    task: BoxedTask,
}

pub struct WorkerPool {
    name: String,
    intake: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    pending: Arc<AtomicUsize>,
}

impl WorkerPool {
    /// Spawn `size` workers (at least one) on the current runtime.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        let name = name.into();
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let pending = Arc::new(AtomicUsize::new(0));

        let workers = (0..size.max(1))
            .map(|index| {
                let rx = Arc::clone(&rx);
                let pending = Arc::clone(&pending);
                let pool = name.clone();
                tokio::spawn(async move {
                    loop {
                        let job = { rx.lock().await.recv().await };
                        let Some(job) = job else {
                            break;
                        };
                        if let Err(e) = job.task.await {
                            warn!(pool = %pool, worker = index, task = %job.name, error = %e, "task failed");
                        }
                        pending.fetch_sub(1, Ordering::SeqCst);
                    }
                    debug!(pool = %pool, worker = index, "worker exited");
                })
            })
            .collect();

        Self {
            name,
            intake: Mutex::new(Some(tx)),
            workers: Mutex::new(workers),
            pending,
        }
    }

    /// Queue a task. Returns immediately; failures are logged by the worker.
    pub fn submit<F>(&self, name: impl Into<String>, task: F) -> Result<(), NodeError>
    where
        F: Future<Output = Result<(), NodeError>> + Send + 'static,
    {
        let intake = self.intake.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = intake.as_ref() else {
            return Err(NodeError::Ingest(format!("worker pool {} is closed", self.name)));
        };
        self.pending.fetch_add(1, Ordering::SeqCst);
        let job = Job {
            name: name.into(),
            task: Box::pin(task),
        };
        if tx.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(NodeError::Ingest(format!("worker pool {} is closed", self.name)));
        }
        Ok(())
    }

    /// Queued plus running tasks.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Refuse new tasks and wait for every queued task to finish.
    pub async fn close_and_drain(&self) {
        self.intake
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for worker in workers {
            if let Err(e) = worker.await {
                warn!(pool = %self.name, error = %e, "worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn single_worker_preserves_submission_order() {
        let pool = WorkerPool::new("test", 1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..20u64 {
            let seen = Arc::clone(&seen);
            pool.submit(format!("task {i}"), async move {
                tokio::time::sleep(Duration::from_millis(20 - i)).await;
                seen.lock().unwrap().push(i);
                Ok(())
            })
            .unwrap();
        }
        pool.close_and_drain().await;
        assert_eq!(*seen.lock().unwrap(), (0..20).collect::<Vec<_>>());
        assert_eq!(pool.pending(), 0);
    }

    #[tokio::test]
    async fn failing_tasks_do_not_stop_the_pool() {
        let pool = WorkerPool::new("test", 2);
        let done = Arc::new(AtomicUsize::new(0));
        for i in 0..6 {
            let done = Arc::clone(&done);
            pool.submit("task", async move {
                done.fetch_add(1, Ordering::SeqCst);
                if i % 2 == 0 {
                    Err(NodeError::Ingest("boom".into()))
                } else {
                    Ok(())
                }
            })
            .unwrap();
        }
        pool.close_and_drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn closed_pool_rejects_tasks() {
        let pool = WorkerPool::new("test", 1);
        pool.close_and_drain().await;
        assert!(pool.submit("late", async { Ok(()) }).is_err());
        assert_eq!(pool.pending(), 0);
    }

    #[tokio::test]
    async fn pending_counts_queued_and_running() {
        let pool = WorkerPool::new("test", 1);
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        pool.submit("blocker", async move {
            let _ = release_rx.await;
            Ok(())
        })
        .unwrap();
        pool.submit("queued", async { Ok(()) }).unwrap();
        assert_eq!(pool.pending(), 2);
        release_tx.send(()).unwrap();
        pool.close_and_drain().await;
        assert_eq!(pool.pending(), 0);
    }
}
