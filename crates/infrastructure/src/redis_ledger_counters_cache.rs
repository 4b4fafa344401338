//! Redis-backed ledger counters cache.

use async_trait::async_trait;
use enrichly_application::{LedgerCountersCache, LedgerCountersKey};
use enrichly_core::{AppError, AppResult};
use enrichly_domain::{ServiceCounters, ServiceName};
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

/// Redis implementation of the ledger counters cache port.
///
/// Entries are keyed by a per-service generation; invalidation bumps the
/// generation so every scope of the service misses at once.
#[derive(Clone)]
pub struct RedisLedgerCountersCache {
    client: redis::Client,
    key_prefix: String,
}

impl RedisLedgerCountersCache {
    /// Creates a cache adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn generation_key(&self, service_name: &ServiceName) -> String {
        format!("{}:{}:generation", self.key_prefix, service_name)
    }

    fn entry_key(&self, key: &LedgerCountersKey, generation: i64) -> String {
        format!(
            "{}:{}:{}:{}",
            self.key_prefix,
            key.service_name,
            generation,
            key.scope.cache_key()
        )
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }

    async fn generation(
        &self,
        connection: &mut MultiplexedConnection,
        service_name: &ServiceName,
    ) -> AppResult<i64> {
        let generation: Option<i64> = connection
            .get(self.generation_key(service_name))
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to read ledger counters generation for '{service_name}': {error}"
                ))
            })?;

        Ok(generation.unwrap_or_default())
    }

    fn encode_counters(counters: ServiceCounters) -> String {
        format!(
            "{},{},{}",
            counters.needing, counters.pending, counters.completed
        )
    }

    fn decode_counters(value: &str) -> AppResult<ServiceCounters> {
        let parts: Vec<&str> = value.split(',').collect();
        if parts.len() != 3 {
            return Err(AppError::Internal(format!(
                "invalid ledger counters cache value '{value}'"
            )));
        }

        Ok(ServiceCounters {
            needing: parse_counter(parts[0], "needing")?,
            pending: parse_counter(parts[1], "pending")?,
            completed: parse_counter(parts[2], "completed")?,
        })
    }
}

#[async_trait]
impl LedgerCountersCache for RedisLedgerCountersCache {
    async fn get_counters(&self, key: &LedgerCountersKey) -> AppResult<Option<ServiceCounters>> {
        let mut connection = self.connection().await?;
        let generation = self.generation(&mut connection, &key.service_name).await?;

        let encoded: Option<String> = connection
            .get(self.entry_key(key, generation))
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to read ledger counters cache entry: {error}"
                ))
            })?;

        encoded.as_deref().map(Self::decode_counters).transpose()
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

        let mut connection = self.connection().await?;
        let generation = self.generation(&mut connection, &key.service_name).await?;

        connection
            .set_ex(
                self.entry_key(key, generation),
                Self::encode_counters(counters),
                u64::from(ttl_seconds),
            )
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to write ledger counters cache entry: {error}"
                ))
            })
    }

    async fn invalidate_service(&self, service_name: &ServiceName) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let _: i64 = connection
            .incr(self.generation_key(service_name), 1)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to invalidate ledger counters for '{service_name}': {error}"
                ))
            })?;

        Ok(())
    }
}

fn parse_counter(value: &str, counter_name: &str) -> AppResult<u64> {
    value.parse::<u64>().map_err(|error| {
        AppError::Internal(format!(
            "invalid ledger counters cache field '{counter_name}' value '{value}': {error}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use enrichly_domain::ServiceCounters;

    use super::RedisLedgerCountersCache;

    #[test]
    fn counters_encoding_round_trips() {
        let counters = ServiceCounters {
            needing: 12,
            pending: 3,
            completed: 40,
        };

        let encoded = RedisLedgerCountersCache::encode_counters(counters);
        assert_eq!(encoded, "12,3,40");
        let decoded = RedisLedgerCountersCache::decode_counters(&encoded);
        assert!(matches!(decoded, Ok(value) if value == counters));
    }

    #[test]
    fn malformed_cache_values_are_rejected() {
        assert!(RedisLedgerCountersCache::decode_counters("1,2").is_err());
        assert!(RedisLedgerCountersCache::decode_counters("1,-2,3").is_err());
    }
}
