use std::collections::BTreeMap;

use async_trait::async_trait;
use enrichly_application::ServiceCatalogRepository;
use enrichly_core::AppResult;
use enrichly_domain::{ServiceDefinition, ServiceName, builtin_service_definitions};
use tokio::sync::RwLock;

/// In-memory service catalog.
#[derive(Default)]
pub struct InMemoryServiceCatalogRepository {
    services: RwLock<BTreeMap<ServiceName, ServiceDefinition>>,
}

impl InMemoryServiceCatalogRepository {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog preloaded with the built-in enrichment services.
    pub fn with_builtin_services() -> AppResult<Self> {
        let services = builtin_service_definitions()?
            .into_iter()
            .map(|service| (service.service_name().clone(), service))
            .collect();

        Ok(Self {
            services: RwLock::new(services),
        })
    }
}

#[async_trait]
impl ServiceCatalogRepository for InMemoryServiceCatalogRepository {
    async fn list_services(&self) -> AppResult<Vec<ServiceDefinition>> {
        Ok(self.services.read().await.values().cloned().collect())
    }

    async fn find_service(
        &self,
        service_name: &ServiceName,
    ) -> AppResult<Option<ServiceDefinition>> {
        Ok(self.services.read().await.get(service_name).cloned())
    }

    async fn save_service(&self, service: ServiceDefinition) -> AppResult<()> {
        self.services
            .write()
            .await
            .insert(service.service_name().clone(), service);
        Ok(())
    }
}
