//! # Bulk Delete Orchestrator
//!
//! Caller-facing entry point. One run goes through:
//!
//! 1. **Validation**: query, object name and limits are checked locally
//! 2. **Enumeration**: every matching record id is fetched up front
//! 3. **Batching**: ids are partitioned into contiguous batches
//! 4. **Dispatch**: the [`BatchScheduler`] runs one job lifecycle per batch
//! 5. **Aggregation**: the [`ResultAggregator`] folds results into the summary
//!
//! Enumeration failures abort the run before any job exists. An empty result
//! set returns a zero summary without touching the ingest API.

use crate::client::{BulkIngestApi, RecordEnumerator};
use crate::config::OrchestrationConfig;
use crate::error::{BulkDeleteError, Result};
use crate::models::{BatchPlan, DeletionReport, DeletionSummary};
use crate::orchestration::aggregator::ResultAggregator;
use crate::orchestration::job_lifecycle::{JobLifecycleClient, LifecyclePolicy};
use crate::orchestration::observer::{LifecycleObserver, TracingObserver};
use crate::orchestration::scheduler::BatchScheduler;
use crate::validation::validate_bulk_delete_request;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// One bulk deletion request. Unset limits fall back to the orchestrator's
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkDeleteRequest {
    pub query: String,
    pub object_name: String,
    pub batch_size: Option<usize>,
    pub max_workers: Option<usize>,
}

impl BulkDeleteRequest {
    pub fn new(query: impl Into<String>, object_name: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            object_name: object_name.into(),
            batch_size: None,
            max_workers: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = Some(max_workers);
        self
    }
}

pub struct BulkDeleteOrchestrator {
    enumerator: Arc<dyn RecordEnumerator>,
    api: Arc<dyn BulkIngestApi>,
    config: OrchestrationConfig,
    observer: Arc<dyn LifecycleObserver>,
}

impl BulkDeleteOrchestrator {
    pub fn new(
        enumerator: Arc<dyn RecordEnumerator>,
        api: Arc<dyn BulkIngestApi>,
        config: OrchestrationConfig,
    ) -> Self {
        Self {
            enumerator,
            api,
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    /// Delete every record matched by `query` and return the summary.
    ///
    /// `batch_size` and `max_workers` default to the configured values
    /// (10000 and 5 unless overridden).
    pub async fn execute_bulk_delete(
        &self,
        query: &str,
        object_name: &str,
        batch_size: Option<usize>,
        max_workers: Option<usize>,
    ) -> Result<DeletionSummary> {
        let request = BulkDeleteRequest {
            query: query.to_string(),
            object_name: object_name.to_string(),
            batch_size,
            max_workers,
        };
        Ok(self.execute(&request).await?.summary)
    }

    /// Run `request` to completion
    pub async fn execute(&self, request: &BulkDeleteRequest) -> Result<DeletionReport> {
        self.execute_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Run `request`, stopping early when `cancel` fires.
    ///
    /// After cancellation no new job is created, in-flight jobs stop polling
    /// and every unfinished batch is reported as a failure.
    #[instrument(skip(self, request, cancel), fields(object = %request.object_name))]
    pub async fn execute_with_cancellation(
        &self,
        request: &BulkDeleteRequest,
        cancel: CancellationToken,
    ) -> Result<DeletionReport> {
        let plan = Arc::new(self.plan(request).await?);
        if plan.is_empty() {
            info!("No records to delete");
            let report = DeletionReport::default();
            self.observer.on_run_finished(&report);
            return Ok(report);
        }

        let max_workers = request.max_workers.unwrap_or(self.config.max_workers);
        let lifecycle = Arc::new(JobLifecycleClient::new(
            Arc::clone(&self.api),
            Arc::clone(&self.observer),
            LifecyclePolicy::from(&self.config),
        ));
        let scheduler = BatchScheduler::new(lifecycle, Arc::clone(&self.observer), max_workers);
        let aggregator = ResultAggregator::new(
            &plan,
            self.config.failure_policy,
            cancel.clone(),
            Arc::clone(&self.observer),
        );

        let (tx, rx) = mpsc::channel(max_workers.saturating_mul(2));
        let target_object: Arc<str> = Arc::from(request.object_name.as_str());

        let ((), report) = tokio::join!(
            scheduler.run(Arc::clone(&plan), target_object, cancel, tx),
            aggregator.consume(rx)
        );
        let report = report?;

        self.observer.on_run_finished(&report);
        Ok(report)
    }

    /// Validate `request`, enumerate its records and partition them
    pub async fn plan(&self, request: &BulkDeleteRequest) -> Result<BatchPlan> {
        let batch_size = request.batch_size.unwrap_or(self.config.batch_size);
        let max_workers = request.max_workers.unwrap_or(self.config.max_workers);
        validate_bulk_delete_request(
            &request.query,
            &request.object_name,
            batch_size,
            max_workers,
        )?;

        let ids = self
            .enumerator
            .fetch_all_ids(&request.query)
            .await
            .map_err(|e| match e {
                BulkDeleteError::Enumeration { .. } => e,
                other => BulkDeleteError::enumeration(other.to_string()),
            })?;
        self.observer.on_records_enumerated(&request.query, ids.len());

        let plan = BatchPlan::partition(&ids, batch_size)?;
        self.observer.on_plan_created(&plan);
        Ok(plan)
    }
}
