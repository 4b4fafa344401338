use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use enrichly_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_JOB_QUEUE_KEY_PREFIX: &str = "enrichly:jobs";
const DEFAULT_COUNTERS_CACHE_KEY_PREFIX: &str = "enrichly:ledger_counters";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerCountersCacheBackend {
    InMemory,
    Redis,
}

impl LedgerCountersCacheBackend {
    fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "in_memory" => Ok(Self::InMemory),
            "redis" => Ok(Self::Redis),
            other => Err(AppError::Validation(format!(
                "LEDGER_COUNTERS_CACHE_BACKEND must be either 'in_memory' or 'redis', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub api_host: String,
    pub api_port: u16,
    pub frontend_url: String,
    pub worker_shared_secret: Option<String>,
    pub job_queue_key_prefix: String,
    pub ledger_counters_cache_backend: LedgerCountersCacheBackend,
    pub ledger_counters_cache_key_prefix: String,
    pub ledger_counters_cache_ttl_seconds: u32,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = optional_non_empty_env("DATABASE_URL");
        if migrate_only && database_url.is_none() {
            return Err(AppError::Validation(
                "DATABASE_URL is required to run migrations".to_owned(),
            ));
        }

        let redis_url = optional_non_empty_env("REDIS_URL");
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let worker_shared_secret = optional_non_empty_env("WORKER_SHARED_SECRET");
        if let Some(secret) = &worker_shared_secret
            && secret.len() < 16
        {
            return Err(AppError::Validation(
                "WORKER_SHARED_SECRET must be at least 16 characters".to_owned(),
            ));
        }

        let job_queue_key_prefix = optional_non_empty_env("JOB_QUEUE_KEY_PREFIX")
            .unwrap_or_else(|| DEFAULT_JOB_QUEUE_KEY_PREFIX.to_owned());

        let ledger_counters_cache_backend = match optional_non_empty_env(
            "LEDGER_COUNTERS_CACHE_BACKEND",
        ) {
            Some(value) => LedgerCountersCacheBackend::parse(value.as_str())?,
            None if redis_url.is_some() => LedgerCountersCacheBackend::Redis,
            None => LedgerCountersCacheBackend::InMemory,
        };
        if ledger_counters_cache_backend == LedgerCountersCacheBackend::Redis
            && redis_url.is_none()
        {
            return Err(AppError::Validation(
                "REDIS_URL is required when LEDGER_COUNTERS_CACHE_BACKEND=redis".to_owned(),
            ));
        }

        let ledger_counters_cache_key_prefix =
            optional_non_empty_env("LEDGER_COUNTERS_CACHE_KEY_PREFIX")
                .unwrap_or_else(|| DEFAULT_COUNTERS_CACHE_KEY_PREFIX.to_owned());
        let ledger_counters_cache_ttl_seconds =
            parse_env_u32("LEDGER_COUNTERS_CACHE_TTL_SECONDS", 5)?;

        Ok(Self {
            migrate_only,
            database_url,
            redis_url,
            api_host,
            api_port,
            frontend_url,
            worker_shared_secret,
            job_queue_key_prefix,
            ledger_counters_cache_backend,
            ledger_counters_cache_key_prefix,
            ledger_counters_cache_ttl_seconds,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }

    /// Redis backs the job queue whenever it is configured.
    pub fn requires_redis(&self) -> bool {
        self.redis_url.is_some()
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, AppError> {
    match optional_non_empty_env(name) {
        Some(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
