use super::*;

impl PostgresLedgerRepository {
    pub(super) async fn list_audit_records_impl(
        &self,
        query: AuditRecordQuery,
    ) -> AppResult<Vec<AuditRecord>> {
        let limit = i64::try_from(query.limit).map_err(|error| {
            AppError::Validation(format!("invalid audit record limit: {error}"))
        })?;
        let offset = i64::try_from(query.offset).map_err(|error| {
            AppError::Validation(format!("invalid audit record offset: {error}"))
        })?;

        let rows = sqlx::query_as::<_, AuditRecordRow>(
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
            WHERE ($1::TEXT IS NULL OR entity_type = $1)
              AND ($2::UUID IS NULL OR entity_id = $2)
              AND ($3::TEXT IS NULL OR service_name = $3)
              AND ($4::TEXT IS NULL OR status = $4)
            ORDER BY started_at DESC, id DESC
            LIMIT $5
            OFFSET $6
            "#,
        )
        .bind(query.entity.map(|entity| entity.entity_type.as_str()))
        .bind(query.entity.map(|entity| entity.entity_id.as_uuid()))
        .bind(
            query
                .service_name
                .as_ref()
                .map(|service_name| service_name.as_str()),
        )
        .bind(query.status.map(|status| status.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit records: {error}")))?;

        rows.into_iter().map(AuditRecord::try_from).collect()
    }
}
