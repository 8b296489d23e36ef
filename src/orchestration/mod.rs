//! # Orchestration Engine
//!
//! Bounded-concurrency execution of bulk deletion jobs.
//!
//! ## Core Components
//!
//! - **BulkDeleteOrchestrator**: caller-facing entry point; validates, enumerates,
//!   batches, dispatches and aggregates
//! - **JobLifecycleClient**: drives one batch through create, upload, close and poll
//! - **BatchScheduler**: runs lifecycles on at most `max_workers` concurrent workers
//! - **ResultAggregator**: single consumer folding batch results into the summary
//! - **LifecycleObserver**: injected sink for progress events
//!
//! ## Data Flow
//!
//! ```text
//! RecordEnumerator -> BatchPlan -> BatchScheduler --(mpsc)--> ResultAggregator -> DeletionReport
//!                                       |
//!                                 JobLifecycleClient -> BulkIngestApi
//! ```

pub mod aggregator;
pub mod bulk_delete;
pub mod job_lifecycle;
pub mod observer;
pub mod scheduler;

pub use aggregator::ResultAggregator;
pub use bulk_delete::{BulkDeleteOrchestrator, BulkDeleteRequest};
pub use job_lifecycle::{JobLifecycleClient, LifecyclePolicy};
pub use observer::{LifecycleObserver, NoopObserver, TracingObserver};
pub use scheduler::{BatchScheduler, SchedulerStats};
