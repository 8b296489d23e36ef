//! # Bulk Delete
//!
//! Command-line front end: deletes every record matched by a SOQL query.
//!
//! Arguments can be given as flags or through the environment (a `.env` file
//! in the working directory is loaded first).

use anyhow::{bail, Context};
use bulk_delete_core::client::{Credentials, SalesforceClient, Session, SessionSource};
use bulk_delete_core::config::{ConfigManager, FailurePolicy};
use bulk_delete_core::logging::init_structured_logging;
use bulk_delete_core::orchestration::{BulkDeleteOrchestrator, BulkDeleteRequest};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "bulk-delete")]
#[command(about = "Delete all records matched by a SOQL query through the Bulk API 2.0")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Query selecting the records to delete, e.g. "SELECT Id FROM Lead WHERE ..."
    #[arg(short, long, env = "SOQL_QUERY")]
    query: String,

    /// API name of the object the records belong to
    #[arg(short, long, env = "OBJECT_NAME")]
    object: String,

    /// Records per deletion job
    #[arg(long, env = "BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Deletion jobs running at the same time
    #[arg(long, env = "MAX_WORKERS")]
    max_workers: Option<usize>,

    #[arg(long, env = "SF_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "SF_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Security token appended to the password at login
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    security_token: Option<String>,

    /// Login domain: `login`, `test` or a My Domain prefix
    #[arg(long, env = "DOMAIN")]
    domain: Option<String>,

    /// Use an existing session instead of logging in
    #[arg(long, env = "SF_INSTANCE_URL", requires = "access_token")]
    instance_url: Option<String>,

    #[arg(long, env = "SF_ACCESS_TOKEN", hide_env_values = true, requires = "instance_url")]
    access_token: Option<String>,

    /// Configuration file (default: config/bulk-delete.yaml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop all jobs on the first batch that fails locally
    #[arg(long)]
    fail_fast: bool,

    /// Give up on a job that has not finished after this many seconds
    #[arg(long)]
    max_poll_wait_secs: Option<u64>,

    /// Abort remote jobs that are cancelled or time out
    #[arg(long)]
    abort_on_cancel: bool,

    /// Enumerate and batch, but create no jobs
    #[arg(long)]
    dry_run: bool,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut manager =
        ConfigManager::load_from_file(cli.config.as_deref()).context("loading configuration")?;
    apply_overrides(&cli, &mut manager);
    let environment = manager.environment().to_string();
    let config = manager.into_config();
    config.validate().context("validating configuration")?;

    let _log_guard = init_structured_logging(&config.logging);
    info!(
        environment = %environment,
        object = %cli.object,
        dry_run = cli.dry_run,
        "Starting bulk delete"
    );

    let session_source = session_source(&cli, &config.salesforce)?;
    let client = Arc::new(SalesforceClient::new(&config.salesforce, session_source)?);
    let orchestrator =
        BulkDeleteOrchestrator::new(client.clone(), client, config.orchestration.clone());

    let request = BulkDeleteRequest {
        query: cli.query.clone(),
        object_name: cli.object.clone(),
        batch_size: cli.batch_size,
        max_workers: cli.max_workers,
    };

    if cli.dry_run {
        let plan = orchestrator.plan(&request).await?;
        println!(
            "{} records in {} batches of up to {} (dry run, nothing deleted)",
            plan.total_records(),
            plan.len(),
            plan.batch_size()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling outstanding jobs");
            signal_token.cancel();
        }
    });

    let report = orchestrator
        .execute_with_cancellation(&request, cancel)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report.summary)?);
    for failure in &report.failures {
        eprintln!(
            "batch {} ({} records) failed during {}: {}",
            failure.batch_index, failure.record_count, failure.stage, failure.message
        );
    }

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn apply_overrides(cli: &Cli, manager: &mut ConfigManager) {
    let config = manager.config_mut();

    if let Some(batch_size) = cli.batch_size {
        config.orchestration.batch_size = batch_size;
    }
    if let Some(max_workers) = cli.max_workers {
        config.orchestration.max_workers = max_workers;
    }
    if cli.fail_fast {
        config.orchestration.failure_policy = FailurePolicy::FailFast;
    }
    if let Some(secs) = cli.max_poll_wait_secs {
        config.orchestration.max_poll_wait_ms = Some(secs.saturating_mul(1000));
    }
    if cli.abort_on_cancel {
        config.orchestration.abort_on_cancel = true;
    }
    if let Some(domain) = &cli.domain {
        config.salesforce.domain = domain.clone();
    }
    if let Some(instance_url) = &cli.instance_url {
        config.salesforce.instance_url = Some(instance_url.clone());
    }
    if let Some(access_token) = &cli.access_token {
        config.salesforce.access_token = Some(access_token.clone());
    }

    config.logging.level = match cli.verbose {
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };
}

fn session_source(
    cli: &Cli,
    salesforce: &bulk_delete_core::config::SalesforceConfig,
) -> anyhow::Result<SessionSource> {
    if let (Some(instance_url), Some(access_token)) =
        (&salesforce.instance_url, &salesforce.access_token)
    {
        return Ok(SessionSource::Static(Session::new(
            instance_url.as_str(),
            access_token.as_str(),
        )));
    }

    let (Some(username), Some(password)) = (&cli.username, &cli.password) else {
        bail!("either SF_USERNAME and SF_PASSWORD or SF_INSTANCE_URL and SF_ACCESS_TOKEN must be set");
    };

    Ok(SessionSource::soap_login(
        Credentials {
            username: username.clone(),
            password: password.clone(),
            security_token: cli.security_token.clone().unwrap_or_default(),
        },
        &salesforce.domain,
    ))
}
