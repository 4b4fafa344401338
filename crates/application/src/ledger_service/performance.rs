use super::*;

impl ServiceDispatchLedger {
    /// Returns run statistics for one configured service.
    pub async fn performance(&self, service_name: &str) -> AppResult<ServicePerformance> {
        let service_name = ServiceName::new(service_name)?;
        self.require_service(&service_name).await?;
        self.repository.service_performance(&service_name).await
    }
}
