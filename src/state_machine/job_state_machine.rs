use super::{
    errors::{StateMachineError, StateMachineResult},
    events::JobEvent,
    states::JobState,
};

/// Tracks one deletion job through
/// `Created -> Uploaded -> Closed -> InProgress -> {Complete | Failed | Aborted}`.
///
/// There is no transition back. Status observations may skip `InProgress`
/// (a small job can finish between two polls); an observation behind the
/// current state is absorbed instead of moving the job backwards.
#[derive(Debug, Clone)]
pub struct JobStateMachine {
    job_id: String,
    current: JobState,
    status_checks: u32,
}

impl JobStateMachine {
    /// Create a state machine for a job the remote side has just created
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            current: JobState::default(),
            status_checks: 0,
        }
    }

    /// Get the current state of the job
    pub fn current_state(&self) -> JobState {
        self.current
    }

    /// Remote job identifier
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Number of status observations applied so far
    pub fn status_checks(&self) -> u32 {
        self.status_checks
    }

    /// Check if the job is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// Apply an event and return the resulting state
    pub fn transition(&mut self, event: &JobEvent) -> StateMachineResult<JobState> {
        let target = Self::determine_target_state(&self.job_id, self.current, event)?;
        if matches!(event, JobEvent::StatusObserved(_)) {
            self.status_checks += 1;
        }
        self.current = target;
        Ok(target)
    }

    /// Determine the target state based on current state and event
    pub fn determine_target_state(
        job_id: &str,
        current: JobState,
        event: &JobEvent,
    ) -> StateMachineResult<JobState> {
        if current.is_terminal() {
            return Err(StateMachineError::AlreadyTerminal {
                job_id: job_id.to_string(),
                state: current.to_string(),
            });
        }

        let target = match (current, event) {
            (JobState::Created, JobEvent::Uploaded { .. }) => JobState::Uploaded,
            (JobState::Uploaded, JobEvent::Closed) => JobState::Closed,

            // Remote-authoritative from here on. Terminal reports always win; a
            // stale or out-of-order progress report leaves the job where it is.
            (JobState::Closed | JobState::InProgress, JobEvent::StatusObserved(observed)) => {
                if observed.is_terminal() || *observed == JobState::InProgress {
                    *observed
                } else {
                    current
                }
            }

            (from, event) => {
                return Err(StateMachineError::InvalidTransition {
                    job_id: job_id.to_string(),
                    from: from.to_string(),
                    event: format!("{event:?}"),
                })
            }
        };

        Ok(target)
    }
}
