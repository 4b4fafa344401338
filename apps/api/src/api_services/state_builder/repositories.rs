use std::sync::Arc;

use enrichly_application::{EntityRepository, LedgerRepository, ServiceCatalogRepository};
use enrichly_core::AppResult;
use enrichly_infrastructure::{
    InMemoryLedgerRepository, InMemoryServiceCatalogRepository, PostgresLedgerRepository,
    PostgresServiceCatalogRepository,
};
use sqlx::PgPool;
use tracing::warn;

pub(super) struct RepositorySet {
    pub(super) ledger_repository: Arc<dyn LedgerRepository>,
    pub(super) entity_repository: Arc<dyn EntityRepository>,
    pub(super) service_catalog: Arc<dyn ServiceCatalogRepository>,
}

pub(super) fn build_repository_set(pool: Option<&PgPool>) -> AppResult<RepositorySet> {
    let Some(pool) = pool else {
        warn!("DATABASE_URL is not set; ledger state is kept in memory and lost on restart");

        let repository = Arc::new(InMemoryLedgerRepository::new());
        return Ok(RepositorySet {
            ledger_repository: repository.clone(),
            entity_repository: repository,
            service_catalog: Arc::new(InMemoryServiceCatalogRepository::with_builtin_services()?),
        });
    };

    let repository = Arc::new(PostgresLedgerRepository::new(pool.clone()));
    Ok(RepositorySet {
        ledger_repository: repository.clone(),
        entity_repository: repository,
        service_catalog: Arc::new(PostgresServiceCatalogRepository::new(pool.clone())),
    })
}
