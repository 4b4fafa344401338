use async_trait::async_trait;
use enrichly_core::AppResult;
use enrichly_domain::{
    AuditRecord, AuditRecordId, EntityRecord, EntityRef, ServiceDefinition, ServiceName,
    ServicePerformance,
};

use super::inputs::{AuditRecordQuery, CompletePendingInput};
use super::snapshot::LedgerSnapshot;

/// Repository port for audit records and dispatch claims.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Loads entities and audit state for one service from a single consistent read.
    async fn load_snapshot(&self, service: &ServiceDefinition) -> AppResult<LedgerSnapshot>;

    /// Inserts pending records whose entity has no pending record for the same service.
    ///
    /// Returns only the records that were stored. Records skipped because another
    /// dispatcher already holds a pending claim are not an error.
    async fn claim_pending(&self, records: Vec<AuditRecord>) -> AppResult<Vec<AuditRecord>>;

    /// Deletes pending records created by a dispatch that could not be submitted.
    ///
    /// Terminal records are never removed. Returns the number of deleted rows.
    async fn release_pending(&self, record_ids: &[AuditRecordId]) -> AppResult<u64>;

    /// Transitions the pending record of one entity and service to a terminal status.
    ///
    /// Returns `NotFound` when no pending record exists.
    async fn complete_pending(&self, input: CompletePendingInput) -> AppResult<AuditRecord>;

    /// Lists audit records newest first.
    async fn list_audit_records(&self, query: AuditRecordQuery) -> AppResult<Vec<AuditRecord>>;

    /// Aggregates run statistics over every audit record of one service.
    async fn service_performance(
        &self,
        service_name: &ServiceName,
    ) -> AppResult<ServicePerformance>;
}

/// Repository port for the business entity directory.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Inserts or replaces one entity.
    async fn save_entity(&self, record: EntityRecord) -> AppResult<()>;

    /// Finds one entity.
    async fn find_entity(&self, entity: EntityRef) -> AppResult<Option<EntityRecord>>;
}

/// Repository port for configured enrichment services.
#[async_trait]
pub trait ServiceCatalogRepository: Send + Sync {
    /// Lists every configured service ordered by name.
    async fn list_services(&self) -> AppResult<Vec<ServiceDefinition>>;

    /// Finds one service by name.
    async fn find_service(
        &self,
        service_name: &ServiceName,
    ) -> AppResult<Option<ServiceDefinition>>;

    /// Inserts or replaces one service definition.
    async fn save_service(&self, service: ServiceDefinition) -> AppResult<()>;
}
