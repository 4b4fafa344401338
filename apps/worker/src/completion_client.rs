use std::time::Duration;

use enrichly_application::QueuedJob;
use enrichly_core::{AppError, AppResult};
use enrichly_domain::CompletionOutcome;
use reqwest::{StatusCode, header};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::executors::ExecutionReport;
use crate::worker_config::WorkerConfig;

const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Serialize)]
struct CompleteJobRequest<'a> {
    entity_type: &'a str,
    entity_id: String,
    service_name: &'a str,
    outcome: &'static str,
    metadata: Map<String, Value>,
    error_message: Option<String>,
    attribute_updates: Option<Map<String, Value>>,
}

/// Reports job outcomes to the API's worker completion endpoint.
pub struct CompletionClient {
    http_client: reqwest::Client,
    endpoint: String,
    worker_shared_secret: String,
    worker_id: String,
}

impl CompletionClient {
    pub fn new(http_client: reqwest::Client, config: &WorkerConfig) -> Self {
        Self {
            http_client,
            endpoint: format!("{}/api/internal/worker/complete", config.api_base_url),
            worker_shared_secret: config.worker_shared_secret.clone(),
            worker_id: config.worker_id.clone(),
        }
    }

    /// Sends one completion, retrying transport and server errors.
    ///
    /// A 404 means the pending record is gone and is never retried.
    pub async fn report(&self, job: &QueuedJob, report: ExecutionReport) -> AppResult<()> {
        let mut metadata = report.metadata;
        metadata.insert("job_id".to_owned(), Value::String(job.job_id.clone()));
        metadata.insert(
            "audit_record_id".to_owned(),
            Value::String(job.audit_record_id.to_string()),
        );

        let request = CompleteJobRequest {
            entity_type: job.entity.entity_type.as_str(),
            entity_id: job.entity.entity_id.to_string(),
            service_name: job.service_name.as_str(),
            outcome: match report.outcome {
                CompletionOutcome::Success => "success",
                CompletionOutcome::Failed => "failed",
            },
            metadata,
            error_message: report.error_message,
            attribute_updates: report.attribute_updates,
        };

        let mut attempt = 1;
        loop {
            match self.send(&request).await {
                Ok(()) => return Ok(()),
                Err(error @ (AppError::NotFound(_) | AppError::Validation(_))) => {
                    return Err(error);
                }
                Err(error) if attempt >= MAX_ATTEMPTS => return Err(error),
                Err(error) => {
                    warn!(
                        worker_id = %self.worker_id,
                        job_id = %job.job_id,
                        attempt,
                        error = %error,
                        "completion callback failed; retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(500 * u64::from(attempt))).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn send(&self, request: &CompleteJobRequest<'_>) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.endpoint.as_str())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.worker_shared_secret),
            )
            .header("x-enrichly-worker-id", self.worker_id.as_str())
            .json(request)
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to call worker completion endpoint: {error}"))
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_owned());
        let message = format!(
            "worker completion endpoint returned status {}: {body}",
            status.as_u16()
        );

        Err(match status {
            StatusCode::NOT_FOUND => AppError::NotFound(message),
            StatusCode::BAD_REQUEST => AppError::Validation(message),
            StatusCode::UNAUTHORIZED => AppError::Unauthorized(message),
            _ => AppError::Unavailable(message),
        })
    }
}
