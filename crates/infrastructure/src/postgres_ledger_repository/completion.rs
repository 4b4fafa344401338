use super::*;

impl PostgresLedgerRepository {
    pub(super) async fn complete_pending_impl(
        &self,
        input: CompletePendingInput,
    ) -> AppResult<AuditRecord> {
        let entity = input.entity;
        let service_name = input.service_name.as_str().to_owned();

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start completion transaction for '{entity}': {error}"
            ))
        })?;

        let row = sqlx::query_as::<_, AuditRecordRow>(
            r#"
            SELECT
                id,
                entity_type,
                entity_id,
                service_name,
                status,
                started_at,
                completed_at,
                duration_ms,
                error_message,
                metadata
            FROM service_audit_records
            WHERE entity_type = $1
              AND entity_id = $2
              AND service_name = $3
              AND status = 'pending'
            FOR UPDATE
            "#,
        )
        .bind(entity.entity_type.as_str())
        .bind(entity.entity_id.as_uuid())
        .bind(service_name.as_str())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load pending '{service_name}' record for '{entity}': {error}"
            ))
        })?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "no pending '{service_name}' record for entity '{entity}'"
            ))
        })?;

        let pending = AuditRecord::try_from(row)?;
        let completed = pending.complete(
            input.outcome,
            input.completed_at,
            input.error_message,
            &input.metadata,
        )?;

        let result = sqlx::query(
            r#"
            UPDATE service_audit_records
            SET status = $2,
                completed_at = $3,
                duration_ms = $4,
                error_message = $5,
                metadata = $6
            WHERE id = $1
              AND status = 'pending'
            "#,
        )
        .bind(completed.id().as_uuid())
        .bind(completed.status().as_str())
        .bind(completed.completed_at())
        .bind(completed.duration_ms())
        .bind(completed.error_message())
        .bind(Value::Object(completed.metadata().clone()))
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to complete audit record '{}': {error}",
                completed.id()
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "no pending '{service_name}' record for entity '{entity}'"
            )));
        }

        if let Some(patch) = input.attribute_updates
            && !patch.is_empty()
        {
            sqlx::query(
                r#"
                UPDATE enrichment_entities
                SET attributes = attributes || $3,
                    updated_at = now()
                WHERE entity_type = $1
                  AND id = $2
                "#,
            )
            .bind(entity.entity_type.as_str())
            .bind(entity.entity_id.as_uuid())
            .bind(Value::Object(patch))
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to apply attribute updates to '{entity}': {error}"
                ))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit completion for '{entity}': {error}"
            ))
        })?;

        Ok(completed)
    }
}
