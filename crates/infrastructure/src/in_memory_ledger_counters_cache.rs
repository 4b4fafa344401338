use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use enrichly_application::{LedgerCountersCache, LedgerCountersKey};
use enrichly_core::AppResult;
use enrichly_domain::{ServiceCounters, ServiceName};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy)]
struct CountersCacheEntry {
    counters: ServiceCounters,
    expires_at: Instant,
}

/// In-memory cache adapter for ledger counters.
#[derive(Default)]
pub struct InMemoryLedgerCountersCache {
    entries: RwLock<HashMap<LedgerCountersKey, CountersCacheEntry>>,
}

impl InMemoryLedgerCountersCache {
    /// Creates an empty in-memory counters cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerCountersCache for InMemoryLedgerCountersCache {
    async fn get_counters(&self, key: &LedgerCountersKey) -> AppResult<Option<ServiceCounters>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > Instant::now() => {
                    return Ok(Some(entry.counters));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= Instant::now())
        {
            entries.remove(key);
        }

        Ok(None)
    }

    async fn set_counters(
        &self,
        key: &LedgerCountersKey,
        counters: ServiceCounters,
        ttl_seconds: u32,
    ) -> AppResult<()> {
        if ttl_seconds == 0 {
            return Ok(());
        }

        let now = Instant::now();
        let expires_at = now
            .checked_add(Duration::from_secs(u64::from(ttl_seconds)))
            .unwrap_or(now);

        self.entries.write().await.insert(
            key.clone(),
            CountersCacheEntry {
                counters,
                expires_at,
            },
        );

        Ok(())
    }

    async fn invalidate_service(&self, service_name: &ServiceName) -> AppResult<()> {
        self.entries
            .write()
            .await
            .retain(|key, _| &key.service_name != service_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use enrichly_application::{LedgerCountersCache, LedgerCountersKey};
    use enrichly_domain::{DispatchScope, ServiceCounters, ServiceName};

    use super::InMemoryLedgerCountersCache;

    fn key(service_name: &str, scope: DispatchScope) -> LedgerCountersKey {
        LedgerCountersKey {
            service_name: ServiceName::new(service_name).unwrap_or_else(|_| unreachable!()),
            scope,
        }
    }

    #[tokio::test]
    async fn invalidation_drops_every_scope_of_one_service() {
        let cache = InMemoryLedgerCountersCache::new();
        let counters = ServiceCounters {
            needing: 3,
            pending: 1,
            completed: 2,
        };
        let german = DispatchScope::for_country("DE").unwrap_or_else(|_| unreachable!());

        for entry in [
            key("domain_testing", DispatchScope::all()),
            key("domain_testing", german.clone()),
            key("domain_mx_testing", DispatchScope::all()),
        ] {
            let stored = cache.set_counters(&entry, counters, 60).await;
            assert!(stored.is_ok());
        }

        let service_name = ServiceName::new("domain_testing").unwrap_or_else(|_| unreachable!());
        assert!(cache.invalidate_service(&service_name).await.is_ok());

        let dropped = cache.get_counters(&key("domain_testing", german)).await;
        assert!(matches!(dropped, Ok(None)));
        let kept = cache
            .get_counters(&key("domain_mx_testing", DispatchScope::all()))
            .await;
        assert!(matches!(kept, Ok(Some(value)) if value == counters));
    }

    #[tokio::test]
    async fn zero_ttl_is_not_stored() {
        let cache = InMemoryLedgerCountersCache::new();
        let entry = key("domain_testing", DispatchScope::all());

        let stored = cache
            .set_counters(&entry, ServiceCounters::default(), 0)
            .await;
        assert!(stored.is_ok());
        assert!(matches!(cache.get_counters(&entry).await, Ok(None)));
    }
}
