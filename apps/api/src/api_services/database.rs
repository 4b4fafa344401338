use enrichly_core::AppError;
use enrichly_domain::builtin_service_definitions;
use enrichly_infrastructure::PostgresServiceCatalogRepository;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub async fn connect_and_migrate(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}

/// Inserts built-in services missing from the catalog; configured rows are left alone.
pub async fn seed_builtin_services(pool: &PgPool) -> Result<(), AppError> {
    let catalog = PostgresServiceCatalogRepository::new(pool.clone());
    let inserted = catalog
        .ensure_services(&builtin_service_definitions()?)
        .await?;

    if inserted > 0 {
        info!(inserted, "seeded built-in enrichment services");
    }

    Ok(())
}
