use async_trait::async_trait;
use enrichly_core::AppResult;
use enrichly_domain::{DispatchScope, ServiceCounters, ServiceName};

/// Cache key for one service counters query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerCountersKey {
    /// Service the counters belong to.
    pub service_name: ServiceName,
    /// Scope the counters were computed for.
    pub scope: DispatchScope,
}

/// Optional cache port for service counters.
#[async_trait]
pub trait LedgerCountersCache: Send + Sync {
    /// Returns cached counters for one key.
    async fn get_counters(&self, key: &LedgerCountersKey) -> AppResult<Option<ServiceCounters>>;

    /// Stores counters for one key with ttl.
    async fn set_counters(
        &self,
        key: &LedgerCountersKey,
        counters: ServiceCounters,
        ttl_seconds: u32,
    ) -> AppResult<()>;

    /// Drops every cached scope of one service.
    async fn invalidate_service(&self, service_name: &ServiceName) -> AppResult<()>;
}
