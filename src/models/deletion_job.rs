use super::batch_plan::{Batch, RecordId};
use super::summary::JobOutcome;
use crate::state_machine::{
    JobEvent, JobState, JobStateMachine, StateMachineError, StateMachineResult,
};
use std::sync::Arc;

/// One remote bulk-delete job.
///
/// Bound to exactly one batch at creation; the id, target object and payload
/// never change afterwards. Terminal counts are captured once, when the first
/// terminal status is observed, and handed out once through [`into_outcome`].
///
/// [`into_outcome`]: DeletionJob::into_outcome
#[derive(Debug, Clone)]
pub struct DeletionJob {
    target_object: String,
    batch_index: usize,
    payload: Arc<[RecordId]>,
    lifecycle: JobStateMachine,
    processed_count: Option<u64>,
    failed_count: Option<u64>,
}

impl DeletionJob {
    /// Track a job the remote side has just created for `batch`
    pub fn new(id: impl Into<String>, target_object: impl Into<String>, batch: &Batch) -> Self {
        Self {
            target_object: target_object.into(),
            batch_index: batch.index(),
            payload: batch.shared_ids(),
            lifecycle: JobStateMachine::new(id),
            processed_count: None,
            failed_count: None,
        }
    }

    pub fn id(&self) -> &str {
        self.lifecycle.job_id()
    }

    pub fn target_object(&self) -> &str {
        &self.target_object
    }

    pub fn batch_index(&self) -> usize {
        self.batch_index
    }

    pub fn payload(&self) -> &[RecordId] {
        &self.payload
    }

    pub fn state(&self) -> JobState {
        self.lifecycle.current_state()
    }

    pub fn status_checks(&self) -> u32 {
        self.lifecycle.status_checks()
    }

    /// Record that the payload was accepted
    pub fn mark_uploaded(&mut self) -> StateMachineResult<JobState> {
        self.lifecycle.transition(&JobEvent::Uploaded {
            record_count: self.payload.len(),
        })
    }

    /// Record that the upload was signalled complete
    pub fn mark_closed(&mut self) -> StateMachineResult<JobState> {
        self.lifecycle.transition(&JobEvent::Closed)
    }

    /// Apply a status check. Counts are only meaningful once the state is
    /// terminal; absent counts default to zero.
    pub fn observe(
        &mut self,
        state: JobState,
        processed: Option<u64>,
        failed: Option<u64>,
    ) -> StateMachineResult<JobState> {
        let state = self.lifecycle.transition(&JobEvent::StatusObserved(state))?;
        if state.is_terminal() {
            self.processed_count = Some(processed.unwrap_or(0));
            self.failed_count = Some(failed.unwrap_or(0));
        }
        Ok(state)
    }

    /// Consume the job and yield its terminal outcome.
    ///
    /// `Complete`, `Failed` and `Aborted` are counted identically.
    pub fn into_outcome(self) -> StateMachineResult<JobOutcome> {
        match (self.processed_count, self.failed_count) {
            (Some(processed), Some(failed)) if self.lifecycle.is_terminal() => Ok(JobOutcome {
                batch_index: self.batch_index,
                job_id: self.lifecycle.job_id().to_string(),
                final_state: self.lifecycle.current_state(),
                record_count: self.payload.len(),
                processed,
                failed,
            }),
            _ => Err(StateMachineError::OutcomeUnavailable {
                job_id: self.lifecycle.job_id().to_string(),
                state: self.lifecycle.current_state().to_string(),
            }),
        }
    }
}
