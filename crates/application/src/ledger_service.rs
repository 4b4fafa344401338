use std::sync::Arc;

use chrono::Utc;
use enrichly_core::{AppError, AppResult};
use enrichly_domain::{
    AuditRecord, AuditRecordId, DispatchBatch, DispatchScope, EntityRecord, ServiceCounters,
    ServiceDefinition, ServiceName, ServicePerformance, effective_batch_size,
};
use tracing::{info, warn};

use crate::ledger_ports::{
    AuditRecordQuery, CompleteDispatchInput, CompletePendingInput, JobHandle, JobSubmission,
    JobSubmitter, LedgerCountersCache, LedgerCountersKey, LedgerRepository,
    ServiceCatalogRepository, UpdateServiceSettingsInput,
};

mod candidates;
mod catalog;
mod completion;
mod counters;
mod dispatch;
mod performance;

pub use candidates::Candidates;

/// Default page size for audit trail listings.
pub const DEFAULT_AUDIT_TRAIL_LIMIT: usize = 50;

/// Largest page size accepted for audit trail listings.
pub const MAX_AUDIT_TRAIL_LIMIT: usize = 500;

/// Tracks which entities have been dispatched to which enrichment service.
///
/// Every candidate, dispatch and counters answer is derived from the audit
/// records held by the [`LedgerRepository`], so the three always agree.
#[derive(Clone)]
pub struct ServiceDispatchLedger {
    repository: Arc<dyn LedgerRepository>,
    catalog: Arc<dyn ServiceCatalogRepository>,
    job_submitter: Arc<dyn JobSubmitter>,
    counters_cache: Option<Arc<dyn LedgerCountersCache>>,
    counters_cache_ttl_seconds: u32,
}

impl ServiceDispatchLedger {
    /// Creates a dispatch ledger.
    #[must_use]
    pub fn new(
        repository: Arc<dyn LedgerRepository>,
        catalog: Arc<dyn ServiceCatalogRepository>,
        job_submitter: Arc<dyn JobSubmitter>,
    ) -> Self {
        Self {
            repository,
            catalog,
            job_submitter,
            counters_cache: None,
            counters_cache_ttl_seconds: 0,
        }
    }

    /// Adds optional counters caching behavior.
    #[must_use]
    pub fn with_counters_cache(
        mut self,
        counters_cache: Arc<dyn LedgerCountersCache>,
        ttl_seconds: u32,
    ) -> Self {
        self.counters_cache = Some(counters_cache);
        self.counters_cache_ttl_seconds = ttl_seconds;
        self
    }

    async fn require_service(&self, service_name: &ServiceName) -> AppResult<ServiceDefinition> {
        self.catalog
            .find_service(service_name)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("enrichment service '{service_name}' does not exist"))
            })
    }

    async fn invalidate_counters(&self, service_name: &ServiceName) {
        let Some(cache) = &self.counters_cache else {
            return;
        };

        if let Err(error) = cache.invalidate_service(service_name).await {
            warn!(
                service_name = %service_name,
                error = %error,
                "failed to invalidate cached ledger counters"
            );
        }
    }
}
