use std::collections::HashSet;

use super::*;

impl PostgresLedgerRepository {
    pub(super) async fn claim_pending_impl(
        &self,
        records: Vec<AuditRecord>,
    ) -> AppResult<Vec<AuditRecord>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(record) = records
            .iter()
            .find(|record| record.status() != AuditStatus::Pending)
        {
            return Err(AppError::Validation(format!(
                "audit record '{}' must be pending to claim",
                record.id()
            )));
        }

        let ids: Vec<uuid::Uuid> = records.iter().map(|record| record.id().as_uuid()).collect();
        let entity_types: Vec<String> = records
            .iter()
            .map(|record| record.entity().entity_type.as_str().to_owned())
            .collect();
        let entity_ids: Vec<uuid::Uuid> = records
            .iter()
            .map(|record| record.entity().entity_id.as_uuid())
            .collect();
        let service_names: Vec<String> = records
            .iter()
            .map(|record| record.service_name().as_str().to_owned())
            .collect();
        let started_at: Vec<DateTime<Utc>> =
            records.iter().map(AuditRecord::started_at).collect();

        // Rows that collide with an existing pending claim are dropped by the
        // partial unique index and simply do not come back.
        let stored_ids: Vec<uuid::Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO service_audit_records (
                id,
                entity_type,
                entity_id,
                service_name,
                status,
                started_at,
                metadata
            )
            SELECT claims.id,
                   claims.entity_type,
                   claims.entity_id,
                   claims.service_name,
                   'pending',
                   claims.started_at,
                   '{}'::JSONB
            FROM UNNEST($1::UUID[], $2::TEXT[], $3::UUID[], $4::TEXT[], $5::TIMESTAMPTZ[])
                AS claims(id, entity_type, entity_id, service_name, started_at)
            ON CONFLICT (entity_type, entity_id, service_name)
                WHERE status = 'pending'
            DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&ids)
        .bind(&entity_types)
        .bind(&entity_ids)
        .bind(&service_names)
        .bind(&started_at)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to claim {} pending audit records: {error}",
                records.len()
            ))
        })?;

        let stored_ids: HashSet<uuid::Uuid> = stored_ids.into_iter().collect();
        Ok(records
            .into_iter()
            .filter(|record| stored_ids.contains(&record.id().as_uuid()))
            .collect())
    }

    pub(super) async fn release_pending_impl(
        &self,
        record_ids: &[AuditRecordId],
    ) -> AppResult<u64> {
        if record_ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<uuid::Uuid> = record_ids.iter().map(AuditRecordId::as_uuid).collect();
        let result = sqlx::query(
            r#"
            DELETE FROM service_audit_records
            WHERE id = ANY($1)
              AND status = 'pending'
            "#,
        )
        .bind(&ids)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to release {} pending audit records: {error}",
                ids.len()
            ))
        })?;

        Ok(result.rows_affected())
    }
}
