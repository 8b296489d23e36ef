use super::states::JobState;
use serde::{Deserialize, Serialize};

/// Events that drive a deletion job through its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum JobEvent {
    /// Remote side accepted the CSV payload
    Uploaded { record_count: usize },
    /// Upload was signalled complete
    Closed,
    /// A status check reported this state
    StatusObserved(JobState),
}

impl JobEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Uploaded { .. } => "uploaded",
            Self::Closed => "closed",
            Self::StatusObserved(_) => "status_observed",
        }
    }

    /// Check if this event reports a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::StatusObserved(state) if state.is_terminal())
    }
}
