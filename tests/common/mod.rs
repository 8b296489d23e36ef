#![allow(dead_code)] // Each integration test crate uses a different subset

pub mod mock_bulk_api;
pub mod strategies;

pub use mock_bulk_api::*;
pub use strategies::*;

use bulk_delete_core::config::OrchestrationConfig;
use bulk_delete_core::models::RecordId;
use std::time::Duration;

/// `count` distinct 18-character record ids
pub fn record_ids(count: usize) -> Vec<RecordId> {
    (0..count).map(|i| format!("00Q5g{i:013}")).collect()
}

/// Orchestration settings with the production poll interval and no limits
pub fn test_orchestration_config(batch_size: usize, max_workers: usize) -> OrchestrationConfig {
    OrchestrationConfig {
        batch_size,
        max_workers,
        poll_interval_ms: Duration::from_secs(5).as_millis() as u64,
        ..OrchestrationConfig::default()
    }
}
