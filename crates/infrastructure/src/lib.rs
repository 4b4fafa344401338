//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_job_queue;
mod in_memory_ledger_counters_cache;
mod in_memory_ledger_repository;
mod in_memory_service_catalog_repository;
mod postgres_ledger_repository;
mod postgres_service_catalog_repository;
mod redis_job_queue;
mod redis_ledger_counters_cache;

pub use in_memory_job_queue::InMemoryJobQueue;
pub use in_memory_ledger_counters_cache::InMemoryLedgerCountersCache;
pub use in_memory_ledger_repository::InMemoryLedgerRepository;
pub use in_memory_service_catalog_repository::InMemoryServiceCatalogRepository;
pub use postgres_ledger_repository::PostgresLedgerRepository;
pub use postgres_service_catalog_repository::PostgresServiceCatalogRepository;
pub use redis_job_queue::RedisJobQueue;
pub use redis_ledger_counters_cache::RedisLedgerCountersCache;
