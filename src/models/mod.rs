//! # Data Model
//!
//! - [`BatchPlan`]: the read-only partition of enumerated record ids into batches
//! - [`DeletionJob`]: one in-flight remote job bound to exactly one batch
//! - [`JobOutcome`] / [`BatchFailure`]: the single result each batch produces
//! - [`DeletionSummary`] / [`DeletionReport`]: the aggregate handed back to callers

pub mod batch_plan;
pub mod deletion_job;
pub mod summary;

pub use batch_plan::{Batch, BatchPlan, RecordId};
pub use deletion_job::DeletionJob;
pub use summary::{BatchFailure, BatchResult, DeletionReport, DeletionSummary, JobOutcome};
