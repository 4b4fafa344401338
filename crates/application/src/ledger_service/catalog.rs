use super::*;

impl ServiceDispatchLedger {
    /// Lists configured enrichment services.
    pub async fn list_services(&self) -> AppResult<Vec<ServiceDefinition>> {
        self.catalog.list_services().await
    }

    /// Returns one configured enrichment service.
    pub async fn find_service(&self, service_name: &str) -> AppResult<ServiceDefinition> {
        let service_name = ServiceName::new(service_name)?;
        self.require_service(&service_name).await
    }

    /// Applies operator settings to one service.
    pub async fn update_service_settings(
        &self,
        service_name: &str,
        input: UpdateServiceSettingsInput,
    ) -> AppResult<ServiceDefinition> {
        let service_name = ServiceName::new(service_name)?;
        let service = self.require_service(&service_name).await?;
        let updated = service.with_settings(
            input.is_active,
            input.default_batch_size,
            input.refresh_interval_hours,
        )?;

        self.catalog.save_service(updated.clone()).await?;
        self.invalidate_counters(&service_name).await;

        info!(
            service_name = %service_name,
            is_active = updated.is_active(),
            default_batch_size = updated.default_batch_size(),
            refresh_interval_hours = ?updated.refresh_interval_hours(),
            "updated enrichment service settings"
        );

        Ok(updated)
    }

    /// Lists audit records newest first.
    pub async fn audit_trail(&self, query: AuditRecordQuery) -> AppResult<Vec<AuditRecord>> {
        if query.limit == 0 || query.limit > MAX_AUDIT_TRAIL_LIMIT {
            return Err(AppError::Validation(format!(
                "limit must be between 1 and {MAX_AUDIT_TRAIL_LIMIT}"
            )));
        }

        self.repository.list_audit_records(query).await
    }
}
