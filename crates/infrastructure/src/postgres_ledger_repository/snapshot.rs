use std::collections::{HashMap, HashSet};

use super::*;

#[derive(Debug, FromRow)]
struct SnapshotEntityRow {
    id: uuid::Uuid,
    attributes: Value,
}

#[derive(Debug, FromRow)]
struct LastSuccessRow {
    entity_id: uuid::Uuid,
    completed_at: DateTime<Utc>,
}

impl PostgresLedgerRepository {
    pub(super) async fn load_snapshot_impl(
        &self,
        service: &ServiceDefinition,
    ) -> AppResult<LedgerSnapshot> {
        let entity_type = service.entity_type().as_str();
        let service_name = service.service_name().as_str();

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start ledger snapshot transaction: {error}"))
        })?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to set ledger snapshot isolation: {error}"))
            })?;

        let taken_at: DateTime<Utc> = sqlx::query_scalar("SELECT now()")
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read ledger snapshot timestamp: {error}"))
            })?;

        let entity_rows = sqlx::query_as::<_, SnapshotEntityRow>(
            r#"
            SELECT id, attributes
            FROM enrichment_entities
            WHERE entity_type = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(entity_type)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load '{entity_type}' entities for '{service_name}': {error}"
            ))
        })?;

        let pending_ids: Vec<uuid::Uuid> = sqlx::query_scalar(
            r#"
            SELECT entity_id
            FROM service_audit_records
            WHERE service_name = $1
              AND entity_type = $2
              AND status = 'pending'
            "#,
        )
        .bind(service_name)
        .bind(entity_type)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load pending records for '{service_name}': {error}"
            ))
        })?;

        let success_rows = sqlx::query_as::<_, LastSuccessRow>(
            r#"
            SELECT entity_id, max(completed_at) AS completed_at
            FROM service_audit_records
            WHERE service_name = $1
              AND entity_type = $2
              AND status = 'success'
            GROUP BY entity_id
            "#,
        )
        .bind(service_name)
        .bind(entity_type)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load successful records for '{service_name}': {error}"
            ))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to close ledger snapshot transaction: {error}"))
        })?;

        let entities = entity_rows
            .into_iter()
            .map(|row| {
                EntityRecord::new(
                    EntityRef::new(service.entity_type(), EntityId::from_uuid(row.id)),
                    row.attributes,
                )
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(LedgerSnapshot {
            taken_at,
            entities,
            pending: pending_ids
                .into_iter()
                .map(EntityId::from_uuid)
                .collect::<HashSet<_>>(),
            last_success: success_rows
                .into_iter()
                .map(|row| (EntityId::from_uuid(row.entity_id), row.completed_at))
                .collect::<HashMap<_, _>>(),
        })
    }
}
