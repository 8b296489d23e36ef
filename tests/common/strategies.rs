use bulk_delete_core::models::{BatchFailure, BatchResult, JobOutcome, RecordId};
use bulk_delete_core::state_machine::{JobStage, JobState};
use proptest::prelude::*;
use proptest::strategy::Just;

/// Strategy for generating 15-character record ids
pub fn record_id_strategy() -> impl Strategy<Value = RecordId> {
    "[a-zA-Z0-9]{15}"
}

/// Strategy for generating distinct id lists of up to `max` records
pub fn record_ids_strategy(max: usize) -> impl Strategy<Value = Vec<RecordId>> {
    prop::collection::hash_set(record_id_strategy(), 0..=max)
        .prop_map(|ids| ids.into_iter().collect())
}

/// Strategy for generating batch sizes
pub fn batch_size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![Just(1usize), Just(10_000usize), 1usize..=64]
}

/// Strategy for generating terminal job states
pub fn terminal_state_strategy() -> impl Strategy<Value = JobState> {
    prop_oneof![
        Just(JobState::Complete),
        Just(JobState::Failed),
        Just(JobState::Aborted),
    ]
}

/// Strategy for generating the stage at which a batch failed locally
pub fn stage_strategy() -> impl Strategy<Value = JobStage> {
    prop_oneof![
        Just(JobStage::Create),
        Just(JobStage::Upload),
        Just(JobStage::Close),
        Just(JobStage::Poll),
    ]
}

/// Strategy for generating one batch result with `record_count` records.
///
/// Finished outcomes split the records between processed and failed.
pub fn batch_result_strategy(
    batch_index: usize,
    record_count: usize,
) -> impl Strategy<Value = BatchResult> {
    let count = record_count as u64;
    prop_oneof![
        3 => (0..=count, terminal_state_strategy()).prop_map(move |(processed, final_state)| {
            BatchResult::Finished(JobOutcome {
                batch_index,
                job_id: format!("7505g{batch_index:013}"),
                final_state,
                record_count,
                processed,
                failed: count - processed,
            })
        }),
        1 => stage_strategy().prop_map(move |stage| {
            BatchResult::Fatal(BatchFailure {
                batch_index,
                record_count,
                job_id: None,
                stage,
                message: "HTTP 503".to_string(),
            })
        }),
    ]
}

/// Strategy for generating one result per batch of a plan with the given sizes
pub fn batch_results_strategy(sizes: Vec<usize>) -> impl Strategy<Value = Vec<BatchResult>> {
    sizes
        .into_iter()
        .enumerate()
        .map(|(index, size)| batch_result_strategy(index, size).boxed())
        .collect::<Vec<_>>()
}
