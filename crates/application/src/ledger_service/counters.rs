use super::*;

impl ServiceDispatchLedger {
    /// Returns needing, pending and completed counts derived from one snapshot.
    pub async fn counters(
        &self,
        service_name: &str,
        scope: &DispatchScope,
    ) -> AppResult<ServiceCounters> {
        let service_name = ServiceName::new(service_name)?;
        let service = self.require_service(&service_name).await?;
        let key = LedgerCountersKey {
            service_name,
            scope: scope.clone(),
        };

        if self.counters_cache_ttl_seconds > 0
            && let Some(cache) = &self.counters_cache
            && let Some(counters) = cache.get_counters(&key).await?
        {
            return Ok(counters);
        }

        let counters = self.load_candidates(service, scope).await?.counters();

        if self.counters_cache_ttl_seconds > 0
            && let Some(cache) = &self.counters_cache
        {
            cache
                .set_counters(&key, counters, self.counters_cache_ttl_seconds)
                .await?;
        }

        Ok(counters)
    }
}
