use crate::constants::remote_states;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one deletion job.
///
/// `Created` and `Uploaded` are tracked locally between the create call and the
/// first status check. From `Closed` onwards the remote job is authoritative and
/// the client only ever learns the state by polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Job accepted by the remote side and still open for uploads
    Created,
    /// Payload accepted, upload not yet signalled complete
    Uploaded,
    /// Upload signalled complete, queued for processing
    Closed,
    /// Remote side is processing the payload
    InProgress,
    /// Processing finished; per-record failures may still be non-zero
    Complete,
    /// Job failed as a whole
    Failed,
    /// Job was aborted
    Aborted,
}

impl JobState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Aborted)
    }

    /// Map a Bulk API 2.0 state string onto the lifecycle.
    ///
    /// `Open` maps to `Created`: the remote side does not distinguish a job that
    /// has received data from one that has not.
    pub fn from_remote(state: &str) -> Option<Self> {
        match state {
            remote_states::OPEN => Some(Self::Created),
            remote_states::UPLOAD_COMPLETE => Some(Self::Closed),
            remote_states::IN_PROGRESS => Some(Self::InProgress),
            remote_states::JOB_COMPLETE => Some(Self::Complete),
            remote_states::FAILED => Some(Self::Failed),
            remote_states::ABORTED => Some(Self::Aborted),
            _ => None,
        }
    }

    /// The Bulk API 2.0 name of this state, if it has one
    pub fn remote_name(&self) -> Option<&'static str> {
        match self {
            Self::Created => Some(remote_states::OPEN),
            Self::Uploaded => None,
            Self::Closed => Some(remote_states::UPLOAD_COMPLETE),
            Self::InProgress => Some(remote_states::IN_PROGRESS),
            Self::Complete => Some(remote_states::JOB_COMPLETE),
            Self::Failed => Some(remote_states::FAILED),
            Self::Aborted => Some(remote_states::ABORTED),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Uploaded => write!(f, "uploaded"),
            Self::Closed => write!(f, "closed"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "uploaded" => Ok(Self::Uploaded),
            "closed" => Ok(Self::Closed),
            "in_progress" => Ok(Self::InProgress),
            "complete" => Ok(Self::Complete),
            "failed" => Ok(Self::Failed),
            "aborted" => Ok(Self::Aborted),
            _ => Err(format!("Invalid job state: {s}")),
        }
    }
}

/// Default state for new jobs
impl Default for JobState {
    fn default() -> Self {
        Self::Created
    }
}

/// Step of the job lifecycle a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStage {
    Create,
    Upload,
    Close,
    Poll,
    Abort,
    /// Failure outside any single remote call (worker panic, scheduler shutdown)
    Dispatch,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Upload => write!(f, "upload"),
            Self::Close => write!(f, "close"),
            Self::Poll => write!(f, "poll"),
            Self::Abort => write!(f, "abort"),
            Self::Dispatch => write!(f, "dispatch"),
        }
    }
}
