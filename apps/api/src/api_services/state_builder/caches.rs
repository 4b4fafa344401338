use std::sync::Arc;

use enrichly_application::{JobSubmitter, LedgerCountersCache};
use enrichly_core::{AppError, AppResult};
use enrichly_infrastructure::{
    InMemoryJobQueue, InMemoryLedgerCountersCache, RedisJobQueue, RedisLedgerCountersCache,
};
use tracing::warn;

use crate::api_config::{ApiConfig, LedgerCountersCacheBackend};

pub(super) fn build_ledger_counters_cache(
    config: &ApiConfig,
    redis_client: Option<redis::Client>,
) -> AppResult<Arc<dyn LedgerCountersCache>> {
    match config.ledger_counters_cache_backend {
        LedgerCountersCacheBackend::InMemory => Ok(Arc::new(InMemoryLedgerCountersCache::new())),
        LedgerCountersCacheBackend::Redis => {
            let redis_client = redis_client.ok_or_else(|| {
                AppError::Validation(
                    "REDIS_URL is required when LEDGER_COUNTERS_CACHE_BACKEND=redis".to_owned(),
                )
            })?;
            Ok(Arc::new(RedisLedgerCountersCache::new(
                redis_client,
                config.ledger_counters_cache_key_prefix.as_str(),
            )))
        }
    }
}

pub(super) fn build_job_submitter(
    config: &ApiConfig,
    redis_client: Option<redis::Client>,
) -> Arc<dyn JobSubmitter> {
    match redis_client {
        Some(redis_client) => Arc::new(RedisJobQueue::new(
            redis_client,
            config.job_queue_key_prefix.as_str(),
        )),
        None => {
            warn!("REDIS_URL is not set; dispatched jobs stay in an in-process queue");
            Arc::new(InMemoryJobQueue::new())
        }
    }
}
