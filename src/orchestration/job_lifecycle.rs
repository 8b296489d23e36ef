//! # Job Lifecycle Client
//!
//! Drives one batch through the remote job lifecycle:
//!
//! ```text
//! create -> upload -> close -> poll every `poll_interval` until terminal -> outcome
//! ```
//!
//! Every step failure aborts the job with the remote error; nothing is
//! retried. Terminal states `Complete`, `Failed` and `Aborted` are counted the
//! same way: the job's `numberRecordsProcessed`/`numberRecordsFailed` (zero if
//! absent) become the outcome.
//!
//! Every remote call and every poll wait is raced against a cancellation
//! token, so a stalled job only ever occupies its own worker. Status reports
//! the lifecycle does not recognise, or that lag behind what was already
//! observed, leave the job running; only a terminal report ends polling. By default there is no
//! upper bound on polling; `max_poll_wait` turns a stalled job into a
//! [`PollTimeout`](crate::error::BulkDeleteError::PollTimeout).

use crate::client::{encode_delete_payload, BulkIngestApi, CreateJobRequest};
use crate::config::OrchestrationConfig;
use crate::error::{BulkDeleteError, Result};
use crate::logging::log_error;
use crate::models::{Batch, BatchFailure, BatchResult, DeletionJob, JobOutcome};
use crate::orchestration::observer::LifecycleObserver;
use crate::state_machine::JobStage;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Timing and hardening knobs of the lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecyclePolicy {
    pub poll_interval: Duration,
    /// `None` polls until the job is terminal, however long that takes
    pub max_poll_wait: Option<Duration>,
    pub abort_on_cancel: bool,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self::from(&OrchestrationConfig::default())
    }
}

impl From<&OrchestrationConfig> for LifecyclePolicy {
    fn from(config: &OrchestrationConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_poll_wait: config.max_poll_wait(),
            abort_on_cancel: config.abort_on_cancel,
        }
    }
}

/// A lifecycle failure tagged with where it happened
#[derive(Debug)]
struct StageError {
    stage: JobStage,
    job_id: Option<String>,
    error: BulkDeleteError,
}

fn at_stage(stage: JobStage, job_id: Option<&str>) -> impl FnOnce(BulkDeleteError) -> StageError {
    let job_id = job_id.map(str::to_string);
    move |error| StageError {
        stage,
        job_id,
        error,
    }
}

pub struct JobLifecycleClient {
    api: Arc<dyn BulkIngestApi>,
    observer: Arc<dyn LifecycleObserver>,
    policy: LifecyclePolicy,
}

impl JobLifecycleClient {
    pub fn new(
        api: Arc<dyn BulkIngestApi>,
        observer: Arc<dyn LifecycleObserver>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            api,
            observer,
            policy,
        }
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    /// Run the full lifecycle for `batch` and return its single result.
    ///
    /// Never returns an error: local failures become [`BatchResult::Fatal`].
    #[instrument(skip(self, batch, cancel), fields(batch_index = batch.index(), records = batch.len()))]
    pub async fn run(
        &self,
        target_object: &str,
        batch: &Batch,
        cancel: &CancellationToken,
    ) -> BatchResult {
        match self.drive(target_object, batch, cancel).await {
            Ok(outcome) => BatchResult::Finished(outcome),
            Err(failure) => {
                if let Some(job_id) = failure.job_id.as_deref() {
                    self.abort_if_abandoned(batch.index(), job_id, &failure.error)
                        .await;
                }
                BatchResult::Fatal(BatchFailure {
                    batch_index: batch.index(),
                    record_count: batch.len(),
                    job_id: failure.job_id,
                    stage: failure.stage,
                    message: failure.error.to_string(),
                })
            }
        }
    }

    async fn drive(
        &self,
        target_object: &str,
        batch: &Batch,
        cancel: &CancellationToken,
    ) -> std::result::Result<JobOutcome, StageError> {
        let batch_index = batch.index();

        // Phase 1: create
        let request = CreateJobRequest::delete(target_object);
        let info = Self::unless_cancelled(cancel, JobStage::Create, self.api.create_job(&request))
            .await
            .map_err(at_stage(JobStage::Create, None))?;

        let mut job = DeletionJob::new(info.id, target_object, batch);
        debug!(batch_index, job_id = %job.id(), "Deletion job created");
        self.observer
            .on_job_state(batch_index, job.id(), job.state());

        // Phase 2: upload the whole payload in one request
        let job_id = job.id().to_string();
        let csv = encode_delete_payload(job.payload());
        Self::unless_cancelled(cancel, JobStage::Upload, self.api.upload_job_data(&job_id, csv))
            .await
            .map_err(at_stage(JobStage::Upload, Some(&job_id)))?;
        let state = job
            .mark_uploaded()
            .map_err(|e| at_stage(JobStage::Upload, Some(&job_id))(e.into()))?;
        self.observer.on_job_state(batch_index, &job_id, state);

        // Phase 3: close
        Self::unless_cancelled(cancel, JobStage::Close, self.api.close_job(&job_id))
            .await
            .map_err(at_stage(JobStage::Close, Some(&job_id)))?;
        let state = job
            .mark_closed()
            .map_err(|e| at_stage(JobStage::Close, Some(&job_id))(e.into()))?;
        self.observer.on_job_state(batch_index, &job_id, state);

        // Phase 4: poll until terminal
        self.poll_until_terminal(&mut job, cancel)
            .await
            .map_err(at_stage(JobStage::Poll, Some(&job_id)))?;

        job.into_outcome()
            .map_err(|e| at_stage(JobStage::Poll, Some(&job_id))(e.into()))
    }

    async fn poll_until_terminal(
        &self,
        job: &mut DeletionJob,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let started = Instant::now();

        loop {
            let info =
                Self::unless_cancelled(cancel, JobStage::Poll, self.api.get_job_status(job.id()))
                    .await?;
            let previous = job.state();
            let state = match info.job_state() {
                Some(observed) => job.observe(
                    observed,
                    info.number_records_processed,
                    info.number_records_failed,
                )?,
                None => {
                    warn!(
                        job_id = %job.id(),
                        remote_state = %info.state,
                        "Unrecognised job state, treating the job as still running"
                    );
                    previous
                }
            };

            if state != previous {
                self.observer
                    .on_job_state(job.batch_index(), job.id(), state);
            }
            if state.is_terminal() {
                debug!(
                    job_id = %job.id(),
                    state = %state,
                    status_checks = job.status_checks(),
                    "Job reached terminal state"
                );
                return Ok(());
            }

            if let Some(max_wait) = self.policy.max_poll_wait {
                let waited = started.elapsed();
                if waited >= max_wait {
                    return Err(BulkDeleteError::poll_timeout(
                        job.id(),
                        u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                    ));
                }
            }

            self.observer
                .on_poll_wait(job.batch_index(), job.id(), state);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(BulkDeleteError::cancelled(JobStage::Poll)),
                _ = sleep(self.policy.poll_interval) => {}
            }
        }
    }

    /// Race a remote call against the token; an already cancelled token wins
    async fn unless_cancelled<T>(
        cancel: &CancellationToken,
        stage: JobStage,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(BulkDeleteError::cancelled(stage)),
            result = call => result,
        }
    }

    /// Ask the remote side to abort a job this client stopped waiting for
    async fn abort_if_abandoned(&self, batch_index: usize, job_id: &str, error: &BulkDeleteError) {
        let abandoned =
            error.is_cancellation() || matches!(error, BulkDeleteError::PollTimeout { .. });
        if !abandoned || !self.policy.abort_on_cancel {
            return;
        }

        warn!(batch_index, job_id = %job_id, reason = %error, "Aborting abandoned job");
        match self.api.abort_job(job_id).await {
            Ok(info) => debug!(job_id = %job_id, state = %info.state, "Abort requested"),
            Err(e) => log_error(
                "job_lifecycle",
                &JobStage::Abort.to_string(),
                &e.to_string(),
                Some(job_id),
            ),
        }
    }
}
