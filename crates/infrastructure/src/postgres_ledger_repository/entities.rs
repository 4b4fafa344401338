use super::*;

impl PostgresLedgerRepository {
    pub(super) async fn save_entity_impl(&self, record: EntityRecord) -> AppResult<()> {
        let entity = record.entity();

        sqlx::query(
            r#"
            INSERT INTO enrichment_entities (entity_type, id, attributes)
            VALUES ($1, $2, $3)
            ON CONFLICT (entity_type, id)
            DO UPDATE SET
                attributes = EXCLUDED.attributes,
                updated_at = now()
            "#,
        )
        .bind(entity.entity_type.as_str())
        .bind(entity.entity_id.as_uuid())
        .bind(record.attributes_value())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to save entity '{entity}': {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn find_entity_impl(
        &self,
        entity: EntityRef,
    ) -> AppResult<Option<EntityRecord>> {
        let attributes: Option<Value> = sqlx::query_scalar(
            r#"
            SELECT attributes
            FROM enrichment_entities
            WHERE entity_type = $1
              AND id = $2
            "#,
        )
        .bind(entity.entity_type.as_str())
        .bind(entity.entity_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find entity '{entity}': {error}"))
        })?;

        attributes
            .map(|attributes| EntityRecord::new(entity, attributes))
            .transpose()
    }
}
