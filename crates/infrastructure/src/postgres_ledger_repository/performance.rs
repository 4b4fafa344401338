use super::*;

#[derive(Debug, FromRow)]
struct ServicePerformanceRow {
    pending_runs: i64,
    successful_runs: i64,
    failed_runs: i64,
    avg_duration_ms: Option<f64>,
    min_duration_ms: Option<i64>,
    max_duration_ms: Option<i64>,
    first_run_at: Option<DateTime<Utc>>,
    last_run_at: Option<DateTime<Utc>>,
}

impl PostgresLedgerRepository {
    pub(super) async fn service_performance_impl(
        &self,
        service_name: &ServiceName,
    ) -> AppResult<ServicePerformance> {
        let row = sqlx::query_as::<_, ServicePerformanceRow>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_runs,
                COUNT(*) FILTER (WHERE status = 'success') AS successful_runs,
                COUNT(*) FILTER (WHERE status = 'failed') AS failed_runs,
                (AVG(duration_ms) FILTER (WHERE status = 'success'))::DOUBLE PRECISION
                    AS avg_duration_ms,
                MIN(duration_ms) FILTER (WHERE status = 'success') AS min_duration_ms,
                MAX(duration_ms) FILTER (WHERE status = 'success') AS max_duration_ms,
                MIN(started_at) AS first_run_at,
                MAX(started_at) AS last_run_at
            FROM service_audit_records
            WHERE service_name = $1
            "#,
        )
        .bind(service_name.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to aggregate performance for service '{service_name}': {error}"
            ))
        })?;

        Ok(ServicePerformance {
            service_name: service_name.clone(),
            pending_runs: count_from_row(row.pending_runs)?,
            successful_runs: count_from_row(row.successful_runs)?,
            failed_runs: count_from_row(row.failed_runs)?,
            avg_duration_ms: row.avg_duration_ms,
            min_duration_ms: row.min_duration_ms,
            max_duration_ms: row.max_duration_ms,
            first_run_at: row.first_run_at,
            last_run_at: row.last_run_at,
        })
    }
}

fn count_from_row(value: i64) -> AppResult<u64> {
    u64::try_from(value)
        .map_err(|error| AppError::Internal(format!("invalid run count '{value}': {error}")))
}
