use async_trait::async_trait;
use enrichly_application::ServiceCatalogRepository;
use enrichly_core::{AppError, AppResult};
use enrichly_domain::{
    EligibilityRule, EntityType, ServiceDefinition, ServiceDefinitionInput, ServiceName,
};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed enrichment service catalog.
#[derive(Clone)]
pub struct PostgresServiceCatalogRepository {
    pool: PgPool,
}

impl PostgresServiceCatalogRepository {
    /// Creates a service catalog repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts services that are not configured yet; existing rows keep operator settings.
    pub async fn ensure_services(&self, services: &[ServiceDefinition]) -> AppResult<u64> {
        let mut inserted = 0;
        for service in services {
            let eligibility = eligibility_to_json(service)?;
            let result = sqlx::query(
                r#"
                INSERT INTO service_configurations (
                    service_name,
                    display_name,
                    entity_type,
                    is_active,
                    default_batch_size,
                    refresh_interval_hours,
                    eligibility
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (service_name) DO NOTHING
                "#,
            )
            .bind(service.service_name().as_str())
            .bind(service.display_name().as_str())
            .bind(service.entity_type().as_str())
            .bind(service.is_active())
            .bind(batch_size_to_db(service)?)
            .bind(refresh_interval_to_db(service)?)
            .bind(eligibility)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to seed enrichment service '{}': {error}",
                    service.service_name()
                ))
            })?;
            inserted += result.rows_affected();
        }

        Ok(inserted)
    }
}

#[derive(Debug, FromRow)]
struct ServiceConfigurationRow {
    service_name: String,
    display_name: String,
    entity_type: String,
    is_active: bool,
    default_batch_size: i32,
    refresh_interval_hours: Option<i32>,
    eligibility: Value,
}

impl TryFrom<ServiceConfigurationRow> for ServiceDefinition {
    type Error = AppError;

    fn try_from(row: ServiceConfigurationRow) -> Result<Self, Self::Error> {
        let eligibility: EligibilityRule =
            serde_json::from_value(row.eligibility).map_err(|error| {
                AppError::Internal(format!(
                    "invalid eligibility rule stored for '{}': {error}",
                    row.service_name
                ))
            })?;
        let default_batch_size = u32::try_from(row.default_batch_size).map_err(|error| {
            AppError::Internal(format!(
                "invalid default_batch_size stored for '{}': {error}",
                row.service_name
            ))
        })?;
        let refresh_interval_hours = row
            .refresh_interval_hours
            .map(u32::try_from)
            .transpose()
            .map_err(|error| {
                AppError::Internal(format!(
                    "invalid refresh_interval_hours stored for '{}': {error}",
                    row.service_name
                ))
            })?;

        ServiceDefinition::new(ServiceDefinitionInput {
            entity_type: EntityType::parse(row.entity_type.as_str())?,
            service_name: row.service_name,
            display_name: row.display_name,
            is_active: row.is_active,
            default_batch_size,
            refresh_interval_hours,
            eligibility,
        })
    }
}

#[async_trait]
impl ServiceCatalogRepository for PostgresServiceCatalogRepository {
    async fn list_services(&self) -> AppResult<Vec<ServiceDefinition>> {
        let rows = sqlx::query_as::<_, ServiceConfigurationRow>(
            r#"
            SELECT
                service_name,
                display_name,
                entity_type,
                is_active,
                default_batch_size,
                refresh_interval_hours,
                eligibility
            FROM service_configurations
            ORDER BY service_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list enrichment services: {error}"))
        })?;

        rows.into_iter().map(ServiceDefinition::try_from).collect()
    }

    async fn find_service(
        &self,
        service_name: &ServiceName,
    ) -> AppResult<Option<ServiceDefinition>> {
        let row = sqlx::query_as::<_, ServiceConfigurationRow>(
            r#"
            SELECT
                service_name,
                display_name,
                entity_type,
                is_active,
                default_batch_size,
                refresh_interval_hours,
                eligibility
            FROM service_configurations
            WHERE service_name = $1
            "#,
        )
        .bind(service_name.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find enrichment service '{service_name}': {error}"
            ))
        })?;

        row.map(ServiceDefinition::try_from).transpose()
    }

    async fn save_service(&self, service: ServiceDefinition) -> AppResult<()> {
        let eligibility = eligibility_to_json(&service)?;

        sqlx::query(
            r#"
            INSERT INTO service_configurations (
                service_name,
                display_name,
                entity_type,
                is_active,
                default_batch_size,
                refresh_interval_hours,
                eligibility
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (service_name)
            DO UPDATE SET
                display_name = EXCLUDED.display_name,
                entity_type = EXCLUDED.entity_type,
                is_active = EXCLUDED.is_active,
                default_batch_size = EXCLUDED.default_batch_size,
                refresh_interval_hours = EXCLUDED.refresh_interval_hours,
                eligibility = EXCLUDED.eligibility,
                updated_at = now()
            "#,
        )
        .bind(service.service_name().as_str())
        .bind(service.display_name().as_str())
        .bind(service.entity_type().as_str())
        .bind(service.is_active())
        .bind(batch_size_to_db(&service)?)
        .bind(refresh_interval_to_db(&service)?)
        .bind(eligibility)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to save enrichment service '{}': {error}",
                service.service_name()
            ))
        })?;

        Ok(())
    }
}

fn eligibility_to_json(service: &ServiceDefinition) -> AppResult<Value> {
    serde_json::to_value(service.eligibility()).map_err(|error| {
        AppError::Internal(format!(
            "failed to encode eligibility rule for '{}': {error}",
            service.service_name()
        ))
    })
}

fn batch_size_to_db(service: &ServiceDefinition) -> AppResult<i32> {
    i32::try_from(service.default_batch_size()).map_err(|error| {
        AppError::Validation(format!("invalid default_batch_size: {error}"))
    })
}

fn refresh_interval_to_db(service: &ServiceDefinition) -> AppResult<Option<i32>> {
    service
        .refresh_interval_hours()
        .map(i32::try_from)
        .transpose()
        .map_err(|error| AppError::Validation(format!("invalid refresh_interval_hours: {error}")))
}
