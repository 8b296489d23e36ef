// State machine module for the deletion job lifecycle
//
// The remote bulk-ingest job owns its state; this module validates that the
// sequence of states the client observes is a legal walk through the lifecycle.

pub mod errors;
pub mod events;
pub mod job_state_machine;
pub mod states;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use events::JobEvent;
pub use job_state_machine::JobStateMachine;
pub use states::{JobStage, JobState};
