//! # System Constants
//!
//! Defaults and wire-level names shared by the client and the orchestration core.

use std::time::Duration;

/// Records per deletion job when the caller does not specify a batch size
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Concurrent job lifecycles when the caller does not specify a worker count
pub const DEFAULT_MAX_WORKERS: usize = 5;

/// Fixed wait between two status checks of the same job
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Salesforce REST API version used for query and ingest endpoints
pub const DEFAULT_API_VERSION: &str = "59.0";

/// Login domain (`login` for production orgs, `test` for sandboxes)
pub const DEFAULT_LOGIN_DOMAIN: &str = "login";

/// Per-request HTTP timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Column header of the single-column delete payload
pub const CSV_ID_HEADER: &str = "Id";

/// Remote job state strings as reported by the Bulk API 2.0
pub mod remote_states {
    pub const OPEN: &str = "Open";
    pub const UPLOAD_COMPLETE: &str = "UploadComplete";
    pub const IN_PROGRESS: &str = "InProgress";
    pub const JOB_COMPLETE: &str = "JobComplete";
    pub const FAILED: &str = "Failed";
    pub const ABORTED: &str = "Aborted";
}

/// Ingest job request vocabulary
pub mod ingest {
    pub const OPERATION_DELETE: &str = "delete";
    pub const CONTENT_TYPE_CSV: &str = "CSV";
    pub const LINE_ENDING_LF: &str = "LF";
}
