use crate::state_machine::{JobStage, JobState};
use serde::{Deserialize, Serialize};

/// Terminal counts of one job, read exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub batch_index: usize,
    pub job_id: String,
    pub final_state: JobState,
    pub record_count: usize,
    pub processed: u64,
    pub failed: u64,
}

/// A batch whose job lifecycle aborted locally (HTTP error, timeout,
/// cancellation, worker panic)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub batch_index: usize,
    pub record_count: usize,
    /// Set when the failure happened after the remote job was created
    pub job_id: Option<String>,
    pub stage: JobStage,
    pub message: String,
}

/// The single result every scheduled batch produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchResult {
    Finished(JobOutcome),
    Fatal(BatchFailure),
}

impl BatchResult {
    pub fn batch_index(&self) -> usize {
        match self {
            Self::Finished(outcome) => outcome.batch_index,
            Self::Fatal(failure) => failure.batch_index,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::Finished(outcome) => Some(&outcome.job_id),
            Self::Fatal(failure) => failure.job_id.as_deref(),
        }
    }

    /// Records the remote side reports as processed
    pub fn processed(&self) -> u64 {
        match self {
            Self::Finished(outcome) => outcome.processed,
            Self::Fatal(_) => 0,
        }
    }

    /// Records counted as failed. A fatal batch counts all of its records.
    pub fn failed(&self) -> u64 {
        match self {
            Self::Finished(outcome) => outcome.failed,
            Self::Fatal(failure) => failure.record_count as u64,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Aggregate counters of one run.
///
/// `total_records` is fixed at enumeration time; the other two only grow.
/// Folding is plain addition, so the result does not depend on the order in
/// which batches finish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionSummary {
    pub total_records: u64,
    pub successful_deletes: u64,
    pub failed_deletes: u64,
}

impl DeletionSummary {
    pub fn new(total_records: u64) -> Self {
        Self {
            total_records,
            ..Self::default()
        }
    }

    /// Add one batch's counts
    pub fn fold(&mut self, result: &BatchResult) {
        self.successful_deletes += result.processed();
        self.failed_deletes += result.failed();
    }

    /// Combine the counters of two partial summaries over disjoint batches
    pub fn merge(self, other: Self) -> Self {
        Self {
            total_records: self.total_records.max(other.total_records),
            successful_deletes: self.successful_deletes + other.successful_deletes,
            failed_deletes: self.failed_deletes + other.failed_deletes,
        }
    }

    /// Records accounted for by finished or failed batches so far
    pub fn accounted(&self) -> u64 {
        self.successful_deletes + self.failed_deletes
    }
}

/// What a run hands back: the summary plus every batch that failed locally
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    pub summary: DeletionSummary,
    pub batches_total: usize,
    pub jobs_completed: usize,
    pub failures: Vec<BatchFailure>,
}

impl DeletionReport {
    /// No batch failed locally. Remote per-record failures may still be non-zero.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(batch_index: usize, processed: u64, failed: u64) -> BatchResult {
        BatchResult::Finished(JobOutcome {
            batch_index,
            job_id: format!("750{batch_index}"),
            final_state: JobState::Complete,
            record_count: (processed + failed) as usize,
            processed,
            failed,
        })
    }

    #[test]
    fn test_fold_adds_counts() {
        let mut summary = DeletionSummary::new(30);
        summary.fold(&finished(0, 10, 0));
        summary.fold(&finished(1, 8, 2));

        assert_eq!(summary.successful_deletes, 18);
        assert_eq!(summary.failed_deletes, 2);
        assert_eq!(summary.total_records, 30);
    }

    #[test]
    fn test_fatal_batch_counts_every_record_as_failed() {
        let failure = BatchResult::Fatal(BatchFailure {
            batch_index: 2,
            record_count: 10,
            job_id: None,
            stage: JobStage::Create,
            message: "HTTP 500".into(),
        });

        let mut summary = DeletionSummary::new(10);
        summary.fold(&failure);

        assert_eq!(summary.successful_deletes, 0);
        assert_eq!(summary.failed_deletes, 10);
        assert!(failure.is_fatal());
        assert_eq!(failure.job_id(), None);
    }

    #[test]
    fn test_merge_of_partials_matches_sequential_fold() {
        let results = [finished(0, 5, 1), finished(1, 3, 3), finished(2, 0, 4)];

        let mut sequential = DeletionSummary::new(16);
        results.iter().for_each(|r| sequential.fold(r));

        let mut left = DeletionSummary::new(16);
        left.fold(&results[2]);
        let mut right = DeletionSummary::new(16);
        right.fold(&results[0]);
        right.fold(&results[1]);

        assert_eq!(left.merge(right), sequential);
        assert_eq!(sequential.accounted(), 16);
    }
}
