//! Enrichly enrichment worker runtime.

#![forbid(unsafe_code)]

mod completion_client;
mod executors;
mod worker_config;

use std::time::Duration;

use enrichly_application::JobSource;
use enrichly_core::{AppError, AppResult};
use enrichly_infrastructure::RedisJobQueue;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::completion_client::CompletionClient;
use crate::executors::JobExecutor;
use crate::worker_config::WorkerConfig;

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let redis_client = redis::Client::open(config.redis_url.as_str())
        .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;
    let job_source = RedisJobQueue::new(redis_client, config.job_queue_key_prefix.as_str());

    let http_timeout = Duration::from_secs(config.http_timeout_seconds);
    let http_client = reqwest::Client::builder()
        .timeout(http_timeout)
        .user_agent(concat!("enrichly-worker/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;
    let executor = JobExecutor::new(http_client.clone(), http_timeout);
    let completion_client = CompletionClient::new(http_client, &config);

    info!(
        worker_id = %config.worker_id,
        api_base_url = %config.api_base_url,
        services = ?config
            .services
            .iter()
            .map(|service| service.as_str())
            .collect::<Vec<_>>(),
        poll_timeout_seconds = config.poll_timeout_seconds,
        "enrichly-worker started"
    );

    loop {
        if let Err(error) =
            run_once(&config, &job_source, &executor, &completion_client).await
        {
            warn!(
                worker_id = %config.worker_id,
                error = %error,
                "failed to poll enrichment jobs"
            );
            tokio::time::sleep(POLL_ERROR_BACKOFF).await;
        }
    }
}

/// Takes at most one job, runs it, and reports its outcome exactly once.
async fn run_once(
    config: &WorkerConfig,
    job_source: &dyn JobSource,
    executor: &JobExecutor,
    completion_client: &CompletionClient,
) -> AppResult<()> {
    let Some(job) = job_source
        .next_job(&config.services, config.poll_timeout_seconds)
        .await?
    else {
        return Ok(());
    };

    let report = executor.execute(&job).await;
    let outcome = report.outcome;

    match completion_client.report(&job, report).await {
        Ok(()) => info!(
            worker_id = %config.worker_id,
            job_id = %job.job_id,
            service_name = %job.service_name,
            entity = %job.entity,
            outcome = ?outcome,
            "enrichment job completed"
        ),
        Err(error) => warn!(
            worker_id = %config.worker_id,
            job_id = %job.job_id,
            service_name = %job.service_name,
            entity = %job.entity,
            error = %error,
            "failed to report enrichment job completion"
        ),
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
