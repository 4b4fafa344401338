use async_trait::async_trait;
use chrono::{DateTime, Utc};
use enrichly_application::{
    AuditRecordQuery, CompletePendingInput, EntityRepository, LedgerRepository, LedgerSnapshot,
};
use enrichly_core::{AppError, AppResult};
use enrichly_domain::{
    AuditRecord, AuditRecordId, AuditRecordParts, AuditStatus, EntityId, EntityRecord, EntityRef,
    EntityType, ServiceDefinition, ServiceName, ServicePerformance,
};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

mod audit;
mod claims;
mod completion;
mod entities;
mod performance;
mod snapshot;

/// PostgreSQL-backed ledger and entity store.
#[derive(Clone)]
pub struct PostgresLedgerRepository {
    pool: PgPool,
}

impl PostgresLedgerRepository {
    /// Creates a ledger repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditRecordRow {
    id: uuid::Uuid,
    entity_type: String,
    entity_id: uuid::Uuid,
    service_name: String,
    status: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    duration_ms: Option<i64>,
    error_message: Option<String>,
    metadata: Value,
}

impl TryFrom<AuditRecordRow> for AuditRecord {
    type Error = AppError;

    fn try_from(row: AuditRecordRow) -> Result<Self, Self::Error> {
        let metadata = match row.metadata {
            Value::Object(metadata) => metadata,
            other => {
                return Err(AppError::Internal(format!(
                    "audit record '{}' has non-object metadata '{other}'",
                    row.id
                )));
            }
        };

        AuditRecord::from_parts(AuditRecordParts {
            id: AuditRecordId::from_uuid(row.id),
            entity: EntityRef::new(
                EntityType::parse(row.entity_type.as_str())?,
                EntityId::from_uuid(row.entity_id),
            ),
            service_name: ServiceName::new(row.service_name)?,
            status: AuditStatus::parse(row.status.as_str())?,
            started_at: row.started_at,
            completed_at: row.completed_at,
            duration_ms: row.duration_ms,
            error_message: row.error_message,
            metadata,
        })
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    async fn load_snapshot(&self, service: &ServiceDefinition) -> AppResult<LedgerSnapshot> {
        self.load_snapshot_impl(service).await
    }

    async fn claim_pending(&self, records: Vec<AuditRecord>) -> AppResult<Vec<AuditRecord>> {
        self.claim_pending_impl(records).await
    }

    async fn release_pending(&self, record_ids: &[AuditRecordId]) -> AppResult<u64> {
        self.release_pending_impl(record_ids).await
    }

    async fn complete_pending(&self, input: CompletePendingInput) -> AppResult<AuditRecord> {
        self.complete_pending_impl(input).await
    }

    async fn list_audit_records(&self, query: AuditRecordQuery) -> AppResult<Vec<AuditRecord>> {
        self.list_audit_records_impl(query).await
    }

    async fn service_performance(
        &self,
        service_name: &ServiceName,
    ) -> AppResult<ServicePerformance> {
        self.service_performance_impl(service_name).await
    }
}

#[async_trait]
impl EntityRepository for PostgresLedgerRepository {
    async fn save_entity(&self, record: EntityRecord) -> AppResult<()> {
        self.save_entity_impl(record).await
    }

    async fn find_entity(&self, entity: EntityRef) -> AppResult<Option<EntityRecord>> {
        self.find_entity_impl(entity).await
    }
}

#[cfg(test)]
mod tests;
