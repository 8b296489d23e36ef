//! In-memory stand-ins for the remote platform.
//!
//! `MockBulkApi` simulates the ingest job resource. Each job's behaviour is
//! scripted by the first record id of its uploaded payload, so a test can
//! target a specific batch even though workers create jobs concurrently.

use async_trait::async_trait;
use bulk_delete_core::client::{BulkIngestApi, CreateJobRequest, JobInfo, RecordEnumerator};
use bulk_delete_core::error::{BulkDeleteError, Result};
use bulk_delete_core::models::{BatchPlan, BatchResult, DeletionReport, RecordId};
use bulk_delete_core::orchestration::LifecycleObserver;
use bulk_delete_core::state_machine::JobState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// How a job behaves once its payload is known
#[derive(Debug, Clone, PartialEq)]
pub enum JobScript {
    /// Report `InProgress` for `in_progress_polls` checks, then `state`.
    /// `None` counts are left out of the response.
    Finish {
        in_progress_polls: u32,
        state: &'static str,
        processed: Option<u64>,
        failed: Option<u64>,
    },
    /// Never leaves `InProgress`
    Stuck,
    /// Upload is rejected with HTTP 400
    RejectUpload,
    /// Close is rejected with HTTP 500
    RejectClose,
    /// The n-th status check reports the n-th raw state string, the last one
    /// repeating. A terminal report counts the whole payload as processed.
    Sequence(&'static [&'static str]),
    /// The upload call never returns
    HangUpload,
    /// The status call panics
    Panic,
}

impl JobScript {
    /// Complete after one in-progress check, with the given counts
    pub fn complete(processed: u64, failed: u64) -> Self {
        Self::Finish {
            in_progress_polls: 1,
            state: "JobComplete",
            processed: Some(processed),
            failed: Some(failed),
        }
    }
}

/// Everything the mock saw for one job
#[derive(Debug, Clone, Default)]
pub struct MockJob {
    pub object: String,
    pub operation: String,
    pub payload: Option<String>,
    pub record_count: u64,
    pub script: Option<JobScript>,
    pub closed: bool,
    pub status_checks: u32,
    pub aborted: bool,
    pub finished: bool,
}

#[derive(Debug, Default)]
pub struct MockApiState {
    pub jobs: HashMap<String, MockJob>,
    pub create_calls: usize,
    pub upload_calls: usize,
    pub close_calls: usize,
    pub status_calls: usize,
    pub abort_calls: Vec<String>,
    pub in_flight: usize,
    pub peak_in_flight: usize,
}

/// Scripted bulk-ingest API
#[derive(Default)]
pub struct MockBulkApi {
    state: Mutex<MockApiState>,
    scripts: Mutex<HashMap<RecordId, JobScript>>,
    failing_creates: Mutex<Vec<usize>>,
}

impl MockBulkApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script the job whose payload starts with `first_id`
    pub fn script(&self, first_id: impl Into<RecordId>, script: JobScript) {
        self.scripts.lock().unwrap().insert(first_id.into(), script);
    }

    /// Reject the n-th create call (1-based) with HTTP 503
    pub fn fail_create_call(&self, call_number: usize) {
        self.failing_creates.lock().unwrap().push(call_number);
    }

    pub fn create_calls(&self) -> usize {
        self.state.lock().unwrap().create_calls
    }

    pub fn upload_calls(&self) -> usize {
        self.state.lock().unwrap().upload_calls
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }

    pub fn abort_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().abort_calls.clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.state.lock().unwrap().peak_in_flight
    }

    pub fn jobs(&self) -> Vec<MockJob> {
        self.state.lock().unwrap().jobs.values().cloned().collect()
    }

    /// The job whose payload starts with `first_id`
    pub fn job_for(&self, first_id: &str) -> Option<MockJob> {
        let prefix = format!("Id\n{first_id}");
        self.state
            .lock()
            .unwrap()
            .jobs
            .values()
            .find(|job| {
                job.payload
                    .as_deref()
                    .is_some_and(|payload| payload == prefix || payload.starts_with(&format!("{prefix}\n")))
            })
            .cloned()
    }

    fn http_error(operation: &str, status: u16) -> BulkDeleteError {
        BulkDeleteError::http(operation, status, r#"[{"errorCode":"MOCK"}]"#)
    }

    fn finish(state: &mut MockApiState, job_id: &str) {
        if let Some(job) = state.jobs.get_mut(job_id) {
            if !job.finished {
                job.finished = true;
                state.in_flight -= 1;
            }
        }
    }
}

#[async_trait]
impl BulkIngestApi for MockBulkApi {
    async fn create_job(&self, request: &CreateJobRequest) -> Result<JobInfo> {
        let mut state = self.state.lock().unwrap();
        state.create_calls += 1;
        let call_number = state.create_calls;

        if self.failing_creates.lock().unwrap().contains(&call_number) {
            return Err(Self::http_error("create_job", 503));
        }

        let id = format!("7505g{call_number:013}");
        state.jobs.insert(
            id.clone(),
            MockJob {
                object: request.object.clone(),
                operation: request.operation.clone(),
                ..MockJob::default()
            },
        );
        state.in_flight += 1;
        state.peak_in_flight = state.peak_in_flight.max(state.in_flight);

        Ok(JobInfo {
            id,
            state: "Open".to_string(),
            object: Some(request.object.clone()),
            operation: Some(request.operation.clone()),
            ..JobInfo::default()
        })
    }

    async fn upload_job_data(&self, job_id: &str, csv: String) -> Result<()> {
        let first_id = csv.lines().nth(1).unwrap_or_default().to_string();
        let record_count = csv.lines().count().saturating_sub(1) as u64;
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&first_id)
            .cloned()
            .unwrap_or_else(|| JobScript::complete(record_count, 0));

        {
            let mut state = self.state.lock().unwrap();
            state.upload_calls += 1;
            let job = state
                .jobs
                .get_mut(job_id)
                .ok_or_else(|| Self::http_error("upload_job_data", 404))?;
            job.payload = Some(csv);
            job.record_count = record_count;
            job.script = Some(script.clone());

            if script == JobScript::RejectUpload {
                Self::finish(&mut state, job_id);
                return Err(Self::http_error("upload_job_data", 400));
            }
        }

        if script == JobScript::HangUpload {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn close_job(&self, job_id: &str) -> Result<JobInfo> {
        let mut state = self.state.lock().unwrap();
        state.close_calls += 1;
        let job = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| Self::http_error("close_job", 404))?;

        if job.script == Some(JobScript::RejectClose) {
            Self::finish(&mut state, job_id);
            return Err(Self::http_error("close_job", 500));
        }
        job.closed = true;

        Ok(JobInfo {
            id: job_id.to_string(),
            state: "UploadComplete".to_string(),
            ..JobInfo::default()
        })
    }

    async fn get_job_status(&self, job_id: &str) -> Result<JobInfo> {
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;
        let job = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| Self::http_error("get_job_status", 404))?;
        job.status_checks += 1;
        let checks = job.status_checks;
        let record_count = job.record_count;
        let script = job.script.clone();

        let in_progress = JobInfo {
            id: job_id.to_string(),
            state: "InProgress".to_string(),
            ..JobInfo::default()
        };

        match script {
            Some(JobScript::Finish {
                in_progress_polls,
                state: terminal,
                processed,
                failed,
            }) => {
                if checks <= in_progress_polls {
                    return Ok(in_progress);
                }
                Self::finish(&mut state, job_id);
                Ok(JobInfo {
                    id: job_id.to_string(),
                    state: terminal.to_string(),
                    number_records_processed: processed,
                    number_records_failed: failed,
                    ..JobInfo::default()
                })
            }
            Some(JobScript::Sequence(states)) => {
                let reported = states[(checks as usize - 1).min(states.len() - 1)];
                let terminal = JobState::from_remote(reported).is_some_and(|s| s.is_terminal());
                if terminal {
                    Self::finish(&mut state, job_id);
                }
                Ok(JobInfo {
                    id: job_id.to_string(),
                    state: reported.to_string(),
                    number_records_processed: terminal.then_some(record_count),
                    number_records_failed: terminal.then_some(0),
                    ..JobInfo::default()
                })
            }
            Some(JobScript::Panic) => {
                drop(state);
                panic!("status endpoint exploded for {job_id}");
            }
            _ => Ok(in_progress),
        }
    }

    async fn abort_job(&self, job_id: &str) -> Result<JobInfo> {
        let mut state = self.state.lock().unwrap();
        state.abort_calls.push(job_id.to_string());
        if let Some(job) = state.jobs.get_mut(job_id) {
            job.aborted = true;
        }
        Self::finish(&mut state, job_id);

        Ok(JobInfo {
            id: job_id.to_string(),
            state: "Aborted".to_string(),
            ..JobInfo::default()
        })
    }
}

/// Enumerator over a fixed id list
pub struct StaticEnumerator {
    ids: Vec<RecordId>,
    queries: Mutex<Vec<String>>,
}

impl StaticEnumerator {
    pub fn new(ids: Vec<RecordId>) -> Arc<Self> {
        Arc::new(Self {
            ids,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordEnumerator for StaticEnumerator {
    async fn fetch_all_ids(&self, query: &str) -> Result<Vec<RecordId>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.ids.clone())
    }
}

/// Enumerator whose query always fails
pub struct FailingEnumerator;

#[async_trait]
impl RecordEnumerator for FailingEnumerator {
    async fn fetch_all_ids(&self, _query: &str) -> Result<Vec<RecordId>> {
        Err(BulkDeleteError::http(
            "query",
            400,
            r#"[{"errorCode":"MALFORMED_QUERY"}]"#,
        ))
    }
}

/// Observed lifecycle events, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    Enumerated(usize),
    Planned(usize),
    BatchStarted(usize),
    JobState(usize, JobState),
    PollWait(usize),
    BatchFinished(usize),
    RunFinished,
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&ObservedEvent) -> bool) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| predicate(event))
            .count()
    }

    fn push(&self, event: ObservedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl LifecycleObserver for RecordingObserver {
    fn on_records_enumerated(&self, _query: &str, total: usize) {
        self.push(ObservedEvent::Enumerated(total));
    }

    fn on_plan_created(&self, plan: &BatchPlan) {
        self.push(ObservedEvent::Planned(plan.len()));
    }

    fn on_batch_started(&self, batch_index: usize, _record_count: usize) {
        self.push(ObservedEvent::BatchStarted(batch_index));
    }

    fn on_job_state(&self, batch_index: usize, _job_id: &str, state: JobState) {
        self.push(ObservedEvent::JobState(batch_index, state));
    }

    fn on_poll_wait(&self, batch_index: usize, _job_id: &str, _state: JobState) {
        self.push(ObservedEvent::PollWait(batch_index));
    }

    fn on_batch_finished(&self, result: &BatchResult) {
        self.push(ObservedEvent::BatchFinished(result.batch_index()));
    }

    fn on_run_finished(&self, _report: &DeletionReport) {
        self.push(ObservedEvent::RunFinished);
    }
}
