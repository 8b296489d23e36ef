//! # Configuration
//!
//! Configuration for a bulk deletion run, layered from built-in defaults, an
//! optional YAML file and `BULK_DELETE_*` environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bulk_delete_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let batch_size = manager.config().orchestration.batch_size;
//! let poll_interval = manager.config().orchestration.poll_interval();
//! # Ok(())
//! # }
//! ```
//!
//! Credentials are never read from the config file; the CLI takes them from
//! the environment (or `.env`) and flags.

pub mod loader;

use crate::constants::{
    DEFAULT_API_VERSION, DEFAULT_BATCH_SIZE, DEFAULT_LOGIN_DOMAIN, DEFAULT_MAX_WORKERS,
    DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::error::{BulkDeleteError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub use loader::ConfigManager;

/// Root configuration structure mirroring config/bulk-delete.yaml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BulkDeleteConfig {
    /// Remote endpoint and session settings
    pub salesforce: SalesforceConfig,

    /// Batching, concurrency and polling
    pub orchestration: OrchestrationConfig,

    /// Console and lifecycle log file output
    pub logging: LoggingConfig,
}

impl BulkDeleteConfig {
    pub fn validate(&self) -> Result<()> {
        self.orchestration.validate()?;
        self.salesforce.validate()?;
        Ok(())
    }
}

/// What the scheduler does when one batch's lifecycle aborts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure, fold the batch as fully failed and keep going
    #[default]
    BestEffort,
    /// Cancel all in-flight work and surface the first failure
    FailFast,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestrationConfig {
    pub batch_size: usize,
    pub max_workers: usize,
    pub poll_interval_ms: u64,
    /// Upper bound on time spent polling one job. `None` polls forever.
    pub max_poll_wait_ms: Option<u64>,
    pub failure_policy: FailurePolicy,
    /// Ask the remote side to abort jobs that were cancelled or timed out
    pub abort_on_cancel: bool,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            max_poll_wait_ms: None,
            failure_policy: FailurePolicy::default(),
            abort_on_cancel: false,
        }
    }
}

impl OrchestrationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_wait(&self) -> Option<Duration> {
        self.max_poll_wait_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(BulkDeleteError::configuration(
                "orchestration.batch_size must be greater than zero",
            ));
        }
        if self.max_workers == 0 {
            return Err(BulkDeleteError::configuration(
                "orchestration.max_workers must be greater than zero",
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(BulkDeleteError::configuration(
                "orchestration.poll_interval_ms must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SalesforceConfig {
    /// Login host prefix: `login`, `test`, or a My Domain name
    pub domain: String,
    pub api_version: String,
    /// Pre-issued session; skips the username/password login when both are set
    pub instance_url: Option<String>,
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_LOGIN_DOMAIN.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            instance_url: None,
            access_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl SalesforceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(BulkDeleteError::configuration("salesforce.domain must not be empty"));
        }
        if self.api_version.parse::<f32>().is_err() {
            return Err(BulkDeleteError::configuration(format!(
                "salesforce.api_version '{}' is not a version number",
                self.api_version
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for SalesforceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SalesforceConfig")
            .field("domain", &self.domain)
            .field("api_version", &self.api_version)
            .field("instance_url", &self.instance_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    pub console: bool,
    /// Directory of the append-only lifecycle log. `None` disables the file.
    pub directory: Option<PathBuf>,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: true,
            directory: Some(PathBuf::from("log")),
            file_name: "bulk_delete.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = BulkDeleteConfig::default();
        assert_eq!(config.orchestration.batch_size, 10_000);
        assert_eq!(config.orchestration.max_workers, 5);
        assert_eq!(config.orchestration.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.orchestration.max_poll_wait(), None);
        assert_eq!(config.orchestration.failure_policy, FailurePolicy::BestEffort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = OrchestrationConfig {
            max_workers: 0,
            ..OrchestrationConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BulkDeleteError::Configuration { .. })
        ));
    }

    #[test]
    fn test_access_token_masked_in_debug() {
        let config = SalesforceConfig {
            access_token: Some("00Dxx!secret".to_string()),
            ..SalesforceConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn test_failure_policy_serde() {
        let policy: FailurePolicy = serde_json::from_str("\"fail_fast\"").unwrap();
        assert_eq!(policy, FailurePolicy::FailFast);
    }
}
