//! Lifecycle observation.
//!
//! The orchestration core reports progress to an injected observer instead of
//! a global logger, so tests can capture or suppress it deterministically.

use crate::logging::{log_batch_operation, log_error, log_job_operation};
use crate::models::{BatchPlan, BatchResult, DeletionReport};
use crate::state_machine::JobState;
use tracing::info;

/// Receives lifecycle events from the orchestration core. All methods default to no-ops.
///
/// Implementations are called from concurrent workers and must not block.
pub trait LifecycleObserver: Send + Sync {
    fn on_records_enumerated(&self, _query: &str, _total: usize) {}

    fn on_plan_created(&self, _plan: &BatchPlan) {}

    /// A worker picked up a batch
    fn on_batch_started(&self, _batch_index: usize, _record_count: usize) {}

    /// A job changed state, either locally (create/upload/close) or through a status check
    fn on_job_state(&self, _batch_index: usize, _job_id: &str, _state: JobState) {}

    /// A status check returned a non-terminal state; the worker will wait and poll again
    fn on_poll_wait(&self, _batch_index: usize, _job_id: &str, _state: JobState) {}

    /// Exactly once per batch
    fn on_batch_finished(&self, _result: &BatchResult) {}

    fn on_run_finished(&self, _report: &DeletionReport) {}
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LifecycleObserver for NoopObserver {}

/// Writes lifecycle events through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LifecycleObserver for TracingObserver {
    fn on_records_enumerated(&self, query: &str, total: usize) {
        info!(query = %query, total_records = total, "Found records to delete");
    }

    fn on_plan_created(&self, plan: &BatchPlan) {
        info!(
            batches = plan.len(),
            batch_size = plan.batch_size(),
            total_records = plan.total_records(),
            "Batch plan created"
        );
    }

    fn on_batch_started(&self, batch_index: usize, record_count: usize) {
        log_batch_operation("started", batch_index, record_count, None, None);
    }

    fn on_job_state(&self, batch_index: usize, job_id: &str, state: JobState) {
        log_job_operation("transition", batch_index, Some(job_id), &state.to_string(), None);
    }

    fn on_poll_wait(&self, batch_index: usize, job_id: &str, state: JobState) {
        tracing::debug!(
            batch_index,
            job_id = %job_id,
            state = %state,
            "Waiting for job to complete"
        );
    }

    fn on_batch_finished(&self, result: &BatchResult) {
        match result {
            BatchResult::Finished(outcome) => log_batch_operation(
                "completed",
                outcome.batch_index,
                outcome.record_count,
                Some(outcome.processed),
                Some(outcome.failed),
            ),
            BatchResult::Fatal(failure) => log_error(
                "job_lifecycle",
                &failure.stage.to_string(),
                &failure.message,
                failure.job_id.as_deref(),
            ),
        }
    }

    fn on_run_finished(&self, report: &DeletionReport) {
        info!(
            total_records = report.summary.total_records,
            successful_deletes = report.summary.successful_deletes,
            failed_deletes = report.summary.failed_deletes,
            failed_batches = report.failures.len(),
            "Bulk deletion finished"
        );
    }
}
