use thiserror::Error;

/// Errors raised while applying lifecycle events to a job
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateMachineError {
    #[error("cannot apply '{event}' to job {job_id} in state {from}")]
    InvalidTransition {
        job_id: String,
        from: String,
        event: String,
    },

    #[error("job {job_id} is already terminal ({state})")]
    AlreadyTerminal { job_id: String, state: String },

    #[error("job {job_id} has no terminal outcome yet (state {state})")]
    OutcomeUnavailable { job_id: String, state: String },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
