//! # Remote Client Layer
//!
//! The orchestration core only talks to the remote platform through two seams:
//!
//! - [`RecordEnumerator`]: run a query and return every matching record id,
//!   pagination fully drained.
//! - [`BulkIngestApi`]: the job resource of the bulk-ingest API
//!   (create, upload, close, status, abort).
//!
//! [`SalesforceClient`] implements both against the Salesforce REST and
//! Bulk API 2.0 endpoints.

pub mod csv_payload;
pub mod salesforce;
pub mod session;
pub mod types;

use crate::error::Result;
use crate::models::RecordId;
use async_trait::async_trait;

pub use csv_payload::encode_delete_payload;
pub use salesforce::SalesforceClient;
pub use session::{Credentials, Session, SessionSource};
pub use types::{CreateJobRequest, JobInfo, JobStateUpdate, QueryRecord, QueryResponse};

/// Resolves a query into the complete set of matching record ids
#[async_trait]
pub trait RecordEnumerator: Send + Sync {
    /// Fetch every matching id. Callers never see partial pages.
    async fn fetch_all_ids(&self, query: &str) -> Result<Vec<RecordId>>;
}

/// Operations on a remote bulk-ingest job, keyed by job id
#[async_trait]
pub trait BulkIngestApi: Send + Sync {
    /// Create a job; the returned info carries the remote job id
    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobInfo>;

    /// Submit the complete CSV payload in one request
    async fn upload_job_data(&self, job_id: &str, csv: String) -> Result<()>;

    /// Signal `UploadComplete`
    async fn close_job(&self, job_id: &str) -> Result<JobInfo>;

    async fn get_job_status(&self, job_id: &str) -> Result<JobInfo>;

    /// Request `Aborted`. Only used for cancelled or timed-out jobs.
    async fn abort_job(&self, job_id: &str) -> Result<JobInfo>;
}
