use std::env;

use enrichly_core::{AppError, AppResult};
use enrichly_domain::ServiceName;

use crate::executors::SUPPORTED_SERVICES;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub redis_url: String,
    pub job_queue_key_prefix: String,
    pub api_base_url: String,
    pub worker_shared_secret: String,
    pub worker_id: String,
    pub services: Vec<ServiceName>,
    pub poll_timeout_seconds: u32,
    pub http_timeout_seconds: u64,
}

impl WorkerConfig {
    pub fn load() -> AppResult<Self> {
        let redis_url = required_env("REDIS_URL")?;
        let job_queue_key_prefix = env::var("JOB_QUEUE_KEY_PREFIX")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "enrichly:jobs".to_owned());
        let api_base_url = env::var("WORKER_API_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3001".to_owned())
            .trim_end_matches('/')
            .to_owned();
        let worker_shared_secret = required_env("WORKER_SHARED_SECRET")?;
        let worker_id = env::var("WORKER_ID")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| format!("worker-{}", std::process::id()));
        let services = parse_services(env::var("WORKER_SERVICES").ok().as_deref())?;
        let poll_timeout_seconds = parse_env_u32("WORKER_POLL_TIMEOUT_SECONDS", 5)?;
        let http_timeout_seconds = parse_env_u64("WORKER_HTTP_TIMEOUT_SECONDS", 15)?;

        if poll_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "WORKER_POLL_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        if http_timeout_seconds == 0 {
            return Err(AppError::Validation(
                "WORKER_HTTP_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            redis_url,
            job_queue_key_prefix,
            api_base_url,
            worker_shared_secret,
            worker_id,
            services,
            poll_timeout_seconds,
            http_timeout_seconds,
        })
    }
}

/// Parses a comma-separated service list; unset or blank selects every supported service.
fn parse_services(raw: Option<&str>) -> AppResult<Vec<ServiceName>> {
    let requested: Vec<&str> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect();

    let requested = if requested.is_empty() {
        SUPPORTED_SERVICES.to_vec()
    } else {
        requested
    };

    let mut services = Vec::with_capacity(requested.len());
    for service_name in requested {
        if !SUPPORTED_SERVICES.contains(&service_name) {
            return Err(AppError::Validation(format!(
                "WORKER_SERVICES contains unsupported service '{service_name}'; supported: {}",
                SUPPORTED_SERVICES.join(", ")
            )));
        }

        let service_name = ServiceName::new(service_name)?;
        if !services.contains(&service_name) {
            services.push(service_name);
        }
    }

    Ok(services)
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use enrichly_core::AppError;

    use super::parse_services;
    use crate::executors::SUPPORTED_SERVICES;

    #[test]
    fn blank_service_list_selects_all_supported_services() {
        let services = parse_services(Some("  ")).unwrap_or_default();
        assert_eq!(services.len(), SUPPORTED_SERVICES.len());
    }

    #[test]
    fn service_list_is_trimmed_and_deduplicated() {
        let services =
            parse_services(Some("domain_testing, domain_testing ,domain_a_record_testing"))
                .unwrap_or_default();
        let names: Vec<&str> = services.iter().map(|service| service.as_str()).collect();
        assert_eq!(names, vec!["domain_testing", "domain_a_record_testing"]);
    }

    #[test]
    fn unsupported_service_is_rejected() {
        let services = parse_services(Some("company_financial_data"));
        assert!(matches!(services, Err(AppError::Validation(_))));
    }
}
