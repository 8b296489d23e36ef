//! Wire types for the query and Bulk API 2.0 ingest endpoints

use crate::constants::{ingest, remote_states};
use crate::state_machine::JobState;
use serde::{Deserialize, Serialize};

/// Body of `POST /jobs/ingest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub object: String,
    pub operation: String,
    pub content_type: String,
    pub line_ending: String,
}

impl CreateJobRequest {
    /// A delete job over CSV with LF line endings
    pub fn delete(object: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            operation: ingest::OPERATION_DELETE.to_string(),
            content_type: ingest::CONTENT_TYPE_CSV.to_string(),
            line_ending: ingest::LINE_ENDING_LF.to_string(),
        }
    }
}

/// Body of `PATCH /jobs/ingest/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStateUpdate {
    pub state: String,
}

impl JobStateUpdate {
    pub fn upload_complete() -> Self {
        Self {
            state: remote_states::UPLOAD_COMPLETE.to_string(),
        }
    }

    pub fn aborted() -> Self {
        Self {
            state: remote_states::ABORTED.to_string(),
        }
    }
}

/// Job info as returned by create, close and status calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub id: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_records_processed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_records_failed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobInfo {
    /// Map the remote state string onto the lifecycle, `None` if unrecognised
    pub fn job_state(&self) -> Option<JobState> {
        JobState::from_remote(&self.state)
    }
}

/// One page of `GET /query`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub total_size: u64,
    pub done: bool,
    #[serde(default)]
    pub next_records_url: Option<String>,
    #[serde(default)]
    pub records: Vec<QueryRecord>,
}

/// A query row; only the id is kept
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRecord {
    #[serde(rename = "Id")]
    pub id: Option<String>,
}
