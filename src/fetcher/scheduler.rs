use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, Notify, Semaphore};

use crate::app::Result;

/// Concurrency limit for the bulk filter pass.
pub const FILTER_WORKERS: usize = 3;
/// Concurrency limit for background aggregation lookups.
pub const BACKGROUND_WORKERS: usize = 2;

/// Bounded-concurrency FIFO queue for network-bound lookup tasks.
///
/// Tasks are started strictly in push order; at most `limit` run at once.
/// Completion order is unconstrained. A failing task is logged and dropped
/// at this boundary and never blocks the backlog or other tasks. There is no
/// priority, cancellation, or de-duplication: pushing the same logical
/// lookup twice yields two independent fetches.
pub struct FetchScheduler {
    tx: mpsc::UnboundedSender<BoxFuture<'static, ()>>,
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl FetchScheduler {
    pub fn new(limit: usize) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<BoxFuture<'static, ()>>();
        let semaphore = Arc::new(Semaphore::new(limit));

        // Runner: pull the backlog in order, waiting for a free slot before
        // launching each task. The permit rides inside the spawned task and
        // frees the slot when the task settles.
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .expect("Semaphore closed");
                tokio::spawn(async move {
                    job.await;
                    drop(permit);
                });
            }
        });

        Self {
            tx,
            pending: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        }
    }

    /// Queue a lookup. Errors are swallowed here so one failed fetch cannot
    /// starve the queue.
    pub fn push<F>(&self, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.pending.fetch_add(1, Ordering::SeqCst);
        let slot = SlotGuard {
            pending: self.pending.clone(),
            idle: self.idle.clone(),
        };

        let job = async move {
            let _slot = slot;
            if let Err(e) = task.await {
                tracing::warn!("scheduled lookup failed: {}", e);
            }
        };

        if self.tx.send(job.boxed()).is_err() {
            tracing::error!("scheduler runner is gone, dropping task");
        }
    }

    /// Number of tasks queued or in flight.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Wait until every queued task has settled.
    pub async fn drain(&self) {
        loop {
            let notified = self.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Decrements the pending counter when a task settles, including on panic.
struct SlotGuard {
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}
