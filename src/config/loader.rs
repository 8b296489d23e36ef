//! Configuration Loader
//!
//! Environment-aware loading: defaults, then an optional YAML file, then
//! `BULK_DELETE_*` environment variables (`__` separates nested keys, e.g.
//! `BULK_DELETE_ORCHESTRATION__MAX_WORKERS=8`).

use super::BulkDeleteConfig;
use crate::error::Result;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "BULK_DELETE";
const DEFAULT_CONFIG_FILE: &str = "config/bulk-delete.yaml";

/// Loaded and validated configuration plus where it came from
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: BulkDeleteConfig,
    environment: String,
    config_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from the default file (if present) and the process environment
    pub fn load() -> Result<Self> {
        Self::load_from_file(None)
    }

    /// Load configuration from a specific file.
    ///
    /// An explicitly given file must exist; the default file is optional.
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Load configuration with an explicit environment map instead of the
    /// process environment. Useful for testing without touching global state.
    pub fn load_with_env(
        path: Option<&Path>,
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        let (file, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let environment = Self::detect_environment();
        debug!(
            environment = %environment,
            file = %file.display(),
            required,
            "Loading bulk delete configuration"
        );

        let config: BulkDeleteConfig = Config::builder()
            .add_source(
                File::from(file.as_path())
                    .format(FileFormat::Yaml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env_vars),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;

        let config_file = (required || file.exists()).then_some(file);

        debug!(config = ?config, "Configuration loaded");

        Ok(Self {
            config,
            environment,
            config_file,
        })
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &BulkDeleteConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut BulkDeleteConfig {
        &mut self.config
    }

    pub fn into_config(self) -> BulkDeleteConfig {
        self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// The file that contributed to this configuration, if any
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Get current environment from environment variables
    pub fn detect_environment() -> String {
        env::var("BULK_DELETE_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }
}
