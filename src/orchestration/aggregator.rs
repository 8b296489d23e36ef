//! # Result Aggregator
//!
//! Folds per-batch results into the run summary. Owned by a single consumer
//! task; workers only ever send results over a channel, so no counter is
//! shared between tasks.

use crate::config::FailurePolicy;
use crate::error::{BulkDeleteError, Result};
use crate::models::{BatchFailure, BatchPlan, BatchResult, DeletionReport, DeletionSummary};
use crate::orchestration::observer::LifecycleObserver;
use crate::state_machine::JobStage;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct ResultAggregator {
    summary: DeletionSummary,
    batch_sizes: Vec<usize>,
    seen: HashSet<usize>,
    jobs_completed: usize,
    failures: Vec<BatchFailure>,
    first_failure: Option<BatchFailure>,
    policy: FailurePolicy,
    cancel: CancellationToken,
    observer: Arc<dyn LifecycleObserver>,
}

impl ResultAggregator {
    pub fn new(
        plan: &BatchPlan,
        policy: FailurePolicy,
        cancel: CancellationToken,
        observer: Arc<dyn LifecycleObserver>,
    ) -> Self {
        Self {
            summary: DeletionSummary::new(plan.total_records() as u64),
            batch_sizes: plan.iter().map(|batch| batch.len()).collect(),
            seen: HashSet::with_capacity(plan.len()),
            jobs_completed: 0,
            failures: Vec::new(),
            first_failure: None,
            policy,
            cancel,
            observer,
        }
    }

    pub fn summary(&self) -> DeletionSummary {
        self.summary
    }

    /// Fold one batch result. Returns `false` if the batch was already counted
    /// or is not part of the plan.
    pub fn record(&mut self, result: BatchResult) -> bool {
        let batch_index = result.batch_index();
        if batch_index >= self.batch_sizes.len() || !self.seen.insert(batch_index) {
            warn!(batch_index, "Ignoring result for unknown or already counted batch");
            return false;
        }

        self.summary.fold(&result);
        self.observer.on_batch_finished(&result);

        match result {
            BatchResult::Finished(_) => self.jobs_completed += 1,
            BatchResult::Fatal(failure) => {
                if self.policy == FailurePolicy::FailFast
                    && self.first_failure.is_none()
                    && !self.cancel.is_cancelled()
                {
                    warn!(
                        batch_index,
                        stage = %failure.stage,
                        "Fail-fast policy: cancelling remaining batches"
                    );
                    self.first_failure = Some(failure.clone());
                    self.cancel.cancel();
                }
                self.failures.push(failure);
            }
        }
        true
    }

    /// Drain `results` until every sender is dropped, then finish
    pub async fn consume(mut self, mut results: mpsc::Receiver<BatchResult>) -> Result<DeletionReport> {
        while let Some(result) = results.recv().await {
            self.record(result);
        }
        self.finish()
    }

    /// Close the run.
    ///
    /// Batches that never reported (a worker died before sending) are counted
    /// as failed so that every batch is accounted for exactly once.
    pub fn finish(mut self) -> Result<DeletionReport> {
        let missing: Vec<usize> = (0..self.batch_sizes.len())
            .filter(|index| !self.seen.contains(index))
            .collect();
        for batch_index in missing {
            debug!(batch_index, "Batch produced no result");
            self.record(BatchResult::Fatal(BatchFailure {
                batch_index,
                record_count: self.batch_sizes[batch_index],
                job_id: None,
                stage: JobStage::Dispatch,
                message: "batch produced no result".to_string(),
            }));
        }

        if let Some(failure) = self.first_failure {
            return Err(BulkDeleteError::batch_failed(
                failure.batch_index,
                failure.stage,
                failure.message,
            ));
        }

        self.failures.sort_by_key(|failure| failure.batch_index);
        Ok(DeletionReport {
            summary: self.summary,
            batches_total: self.batch_sizes.len(),
            jobs_completed: self.jobs_completed,
            failures: self.failures,
        })
    }
}
