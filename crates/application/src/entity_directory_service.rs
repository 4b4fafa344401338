use std::sync::Arc;

use enrichly_core::AppResult;
use enrichly_domain::{EntityRecord, EntityRef};
use serde_json::Value;
use tracing::warn;

use crate::ledger_ports::{EntityRepository, LedgerCountersCache, ServiceCatalogRepository};

/// Registers business entities that enrichment services run against.
#[derive(Clone)]
pub struct EntityDirectoryService {
    repository: Arc<dyn EntityRepository>,
    catalog: Arc<dyn ServiceCatalogRepository>,
    counters_cache: Option<Arc<dyn LedgerCountersCache>>,
}

impl EntityDirectoryService {
    /// Creates an entity directory service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn EntityRepository>,
        catalog: Arc<dyn ServiceCatalogRepository>,
    ) -> Self {
        Self {
            repository,
            catalog,
            counters_cache: None,
        }
    }

    /// Invalidates cached counters of affected services when entities change.
    #[must_use]
    pub fn with_counters_cache(mut self, counters_cache: Arc<dyn LedgerCountersCache>) -> Self {
        self.counters_cache = Some(counters_cache);
        self
    }

    /// Inserts or replaces one entity and its attributes.
    pub async fn register_entity(
        &self,
        entity: EntityRef,
        attributes: Value,
    ) -> AppResult<EntityRecord> {
        let record = EntityRecord::new(entity, attributes)?;
        self.repository.save_entity(record.clone()).await?;

        if let Some(cache) = &self.counters_cache {
            for service in self.catalog.list_services().await? {
                if service.entity_type() != entity.entity_type {
                    continue;
                }

                if let Err(error) = cache.invalidate_service(service.service_name()).await {
                    warn!(
                        service_name = %service.service_name(),
                        error = %error,
                        "failed to invalidate cached ledger counters"
                    );
                }
            }
        }

        Ok(record)
    }

    /// Returns one entity.
    pub async fn find_entity(&self, entity: EntityRef) -> AppResult<Option<EntityRecord>> {
        self.repository.find_entity(entity).await
    }
}
