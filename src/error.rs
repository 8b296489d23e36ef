//! # Error Types
//!
//! Structured error handling for the bulk deletion pipeline using thiserror.
//!
//! Errors fall into three groups:
//! - **Operation-fatal**: enumeration, authentication, validation and configuration
//!   failures abort the whole run before any deletion job is created.
//! - **Batch-fatal**: HTTP/transport failures during create, upload, close or poll
//!   abort a single job. The scheduler decides how these surface (see
//!   [`FailurePolicy`](crate::config::FailurePolicy)).
//! - **Control flow**: cancellation and poll timeouts raised by the opt-in hardening.

use crate::state_machine::{JobStage, StateMachineError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BulkDeleteError {
    #[error("Record enumeration failed: {message}")]
    Enumeration { message: String },

    #[error("Remote API error during {operation}: HTTP {status}: {body}")]
    Http {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Transport error during {operation}: {message}")]
    Transport { operation: String, message: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Invalid job state transition: {0}")]
    InvalidTransition(#[from] StateMachineError),

    #[error("Job {job_id} did not reach a terminal state within {waited_ms}ms")]
    PollTimeout { job_id: String, waited_ms: u64 },

    #[error("Cancelled during {stage}")]
    Cancelled { stage: JobStage },

    #[error("Batch {batch_index} failed during {stage}: {message}")]
    BatchFailed {
        batch_index: usize,
        stage: JobStage,
        message: String,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl BulkDeleteError {
    /// Create an enumeration error
    pub fn enumeration(message: impl Into<String>) -> Self {
        Self::Enumeration {
            message: message.into(),
        }
    }

    /// Create an HTTP error from a non-success response
    pub fn http(operation: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a transport error (connection refused, TLS, decode failures)
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a poll timeout error
    pub fn poll_timeout(job_id: impl Into<String>, waited_ms: u64) -> Self {
        Self::PollTimeout {
            job_id: job_id.into(),
            waited_ms,
        }
    }

    /// Create a cancellation error for the given lifecycle stage
    pub fn cancelled(stage: JobStage) -> Self {
        Self::Cancelled { stage }
    }

    /// Create a batch failure error
    pub fn batch_failed(batch_index: usize, stage: JobStage, message: impl Into<String>) -> Self {
        Self::BatchFailed {
            batch_index,
            stage,
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Whether this error was produced by cancellation rather than a remote failure
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<reqwest::Error> for BulkDeleteError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::http("request", status.as_u16(), err.to_string());
        }
        Self::transport("request", err.to_string())
    }
}

impl From<serde_json::Error> for BulkDeleteError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<config::ConfigError> for BulkDeleteError {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BulkDeleteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        let err = BulkDeleteError::http("create_job", 400, "INVALID_SOBJECT");
        assert_eq!(
            err.to_string(),
            "Remote API error during create_job: HTTP 400: INVALID_SOBJECT"
        );
    }

    #[test]
    fn test_cancellation_detection() {
        assert!(BulkDeleteError::cancelled(JobStage::Poll).is_cancellation());
        assert!(!BulkDeleteError::poll_timeout("750xx", 10).is_cancellation());
    }
}
