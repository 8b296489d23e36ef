#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Bulk Delete Core
//!
//! Deletes every record matched by a query through the Salesforce Bulk API 2.0,
//! running many remote deletion jobs concurrently and reporting one summary.
//!
//! ## Overview
//!
//! A run enumerates all matching record ids, partitions them into batches of
//! `batch_size`, and drives one remote job per batch through
//! create, upload, close and poll. At most `max_workers` jobs are in flight at
//! once. Per-record failures reported by the remote side are counted, never
//! retried.
//!
//! ## Module Organization
//!
//! - [`client`] - Remote query and bulk-ingest client
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//! - [`models`] - Batches, jobs and summaries
//! - [`orchestration`] - Job lifecycle, scheduling and aggregation
//! - [`state_machine`] - Remote job lifecycle tracking
//! - [`validation`] - Request validation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bulk_delete_core::client::{SalesforceClient, Session};
//! use bulk_delete_core::config::BulkDeleteConfig;
//! use bulk_delete_core::orchestration::BulkDeleteOrchestrator;
//! use std::sync::Arc;
//!
//! # async fn example() -> bulk_delete_core::Result<()> {
//! let config = BulkDeleteConfig::default();
//! let session = Session::new("https://acme.my.salesforce.com", "00D...");
//! let client = Arc::new(SalesforceClient::with_session(&config.salesforce, session)?);
//!
//! let orchestrator =
//!     BulkDeleteOrchestrator::new(client.clone(), client, config.orchestration);
//! let summary = orchestrator
//!     .execute_bulk_delete("SELECT Id FROM Lead WHERE IsConverted = true", "Lead", None, None)
//!     .await?;
//!
//! println!(
//!     "{} of {} records deleted, {} failed",
//!     summary.successful_deletes, summary.total_records, summary.failed_deletes
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration and property tests
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod state_machine;
pub mod validation;

pub use config::{BulkDeleteConfig, ConfigManager, FailurePolicy, OrchestrationConfig};
pub use error::{BulkDeleteError, Result};
pub use models::{BatchFailure, BatchPlan, DeletionReport, DeletionSummary, JobOutcome};
pub use orchestration::{BulkDeleteOrchestrator, BulkDeleteRequest};
pub use state_machine::{JobStage, JobState};
