use enrichly_application::{EntityDirectoryService, ServiceDispatchLedger};
use enrichly_core::AppError;
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

use super::redis::build_redis_client;

mod caches;
mod repositories;

pub fn build_app_state(pool: Option<PgPool>, config: &ApiConfig) -> Result<AppState, AppError> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let repositories = repositories::build_repository_set(pool.as_ref())?;
    let counters_cache = caches::build_ledger_counters_cache(config, redis_client.clone())?;
    let job_submitter = caches::build_job_submitter(config, redis_client.clone());

    Ok(AppState {
        ledger: ServiceDispatchLedger::new(
            repositories.ledger_repository,
            repositories.service_catalog.clone(),
            job_submitter,
        )
        .with_counters_cache(
            counters_cache.clone(),
            config.ledger_counters_cache_ttl_seconds,
        ),
        entity_directory: EntityDirectoryService::new(
            repositories.entity_repository,
            repositories.service_catalog,
        )
        .with_counters_cache(counters_cache),
        worker_shared_secret: config.worker_shared_secret.clone(),
        postgres_pool: pool,
        redis_client,
        redis_required: config.requires_redis(),
    })
}
