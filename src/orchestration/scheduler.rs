//! # Batch Scheduler
//!
//! Runs one job lifecycle per batch with at most `max_workers` in flight.
//!
//! Workers pull the next batch index from a shared cursor, so dispatch order
//! follows batch order while completion order is whatever the remote side
//! produces. Every batch yields exactly one [`BatchResult`] on the results
//! channel, including batches whose worker panicked and batches skipped after
//! cancellation.

use crate::logging::log_error;
use crate::models::{BatchFailure, BatchPlan, BatchResult};
use crate::orchestration::job_lifecycle::JobLifecycleClient;
use crate::orchestration::observer::LifecycleObserver;
use crate::state_machine::JobStage;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Live view of what the scheduler is doing
#[derive(Debug, Default)]
pub struct SchedulerStats {
    active: Mutex<BTreeSet<usize>>,
    peak_active: AtomicUsize,
    dispatched: AtomicUsize,
}

impl SchedulerStats {
    /// Batch indices with a lifecycle currently in flight
    pub fn active_batches(&self) -> Vec<usize> {
        self.active.lock().iter().copied().collect()
    }

    /// Highest number of lifecycles that were ever in flight at once
    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::Acquire)
    }

    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::Acquire)
    }

    fn enter(&self, batch_index: usize) {
        let mut active = self.active.lock();
        active.insert(batch_index);
        self.peak_active.fetch_max(active.len(), Ordering::AcqRel);
        self.dispatched.fetch_add(1, Ordering::AcqRel);
    }

    fn exit(&self, batch_index: usize) {
        self.active.lock().remove(&batch_index);
    }
}

pub struct BatchScheduler {
    lifecycle: Arc<JobLifecycleClient>,
    observer: Arc<dyn LifecycleObserver>,
    max_workers: usize,
    stats: Arc<SchedulerStats>,
}

impl BatchScheduler {
    pub fn new(
        lifecycle: Arc<JobLifecycleClient>,
        observer: Arc<dyn LifecycleObserver>,
        max_workers: usize,
    ) -> Self {
        Self {
            lifecycle,
            observer,
            max_workers: max_workers.max(1),
            stats: Arc::new(SchedulerStats::default()),
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn stats(&self) -> Arc<SchedulerStats> {
        Arc::clone(&self.stats)
    }

    /// Dispatch every batch of `plan` and send each result to `results`.
    ///
    /// Returns once all workers have exited. The sender is dropped on return,
    /// which closes the channel for the consumer.
    pub async fn run(
        &self,
        plan: Arc<BatchPlan>,
        target_object: Arc<str>,
        cancel: CancellationToken,
        results: mpsc::Sender<BatchResult>,
    ) {
        let worker_count = self.max_workers.min(plan.len());
        if worker_count == 0 {
            return;
        }

        info!(
            batches = plan.len(),
            workers = worker_count,
            "Dispatching deletion jobs"
        );

        let cursor = Arc::new(AtomicUsize::new(0));
        let mut workers = JoinSet::new();

        for worker_id in 0..worker_count {
            let worker = Worker {
                id: worker_id,
                plan: Arc::clone(&plan),
                target_object: Arc::clone(&target_object),
                cursor: Arc::clone(&cursor),
                lifecycle: Arc::clone(&self.lifecycle),
                observer: Arc::clone(&self.observer),
                stats: Arc::clone(&self.stats),
                cancel: cancel.clone(),
                results: results.clone(),
            };
            workers.spawn(worker.run());
        }
        drop(results);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                log_error("batch_scheduler", "join_worker", &e.to_string(), None);
            }
        }

        debug!(
            dispatched = self.stats.dispatched(),
            peak_active = self.stats.peak_active(),
            "All workers exited"
        );
    }
}

struct Worker {
    id: usize,
    plan: Arc<BatchPlan>,
    target_object: Arc<str>,
    cursor: Arc<AtomicUsize>,
    lifecycle: Arc<JobLifecycleClient>,
    observer: Arc<dyn LifecycleObserver>,
    stats: Arc<SchedulerStats>,
    cancel: CancellationToken,
    results: mpsc::Sender<BatchResult>,
}

impl Worker {
    async fn run(self) {
        loop {
            let index = self.cursor.fetch_add(1, Ordering::AcqRel);
            let Some(batch) = self.plan.get(index) else {
                break;
            };

            self.stats.enter(index);
            self.observer.on_batch_started(index, batch.len());
            debug!(worker_id = self.id, batch_index = index, "Worker picked up batch");

            let lifecycle = self
                .lifecycle
                .run(&self.target_object, batch, &self.cancel);
            let result = match AssertUnwindSafe(lifecycle).catch_unwind().await {
                Ok(result) => result,
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    warn!(worker_id = self.id, batch_index = index, panic = %message, "Job lifecycle panicked");
                    BatchResult::Fatal(BatchFailure {
                        batch_index: index,
                        record_count: batch.len(),
                        job_id: None,
                        stage: JobStage::Dispatch,
                        message: format!("worker panicked: {message}"),
                    })
                }
            };

            self.stats.exit(index);
            if self.results.send(result).await.is_err() {
                warn!(
                    worker_id = self.id,
                    batch_index = index,
                    "Result channel closed, stopping worker"
                );
                break;
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
