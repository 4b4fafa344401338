//! Redis-backed enrichment job queue.

use async_trait::async_trait;
use chrono::Utc;
use enrichly_application::{JobHandle, JobSource, JobSubmission, JobSubmitter, QueuedJob};
use enrichly_core::{AppError, AppResult};
use enrichly_domain::ServiceName;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tracing::warn;

/// Redis list per service; producers push left, workers pop right.
#[derive(Clone)]
pub struct RedisJobQueue {
    client: redis::Client,
    key_prefix: String,
}

impl RedisJobQueue {
    /// Creates a queue adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn key_for(&self, service_name: &ServiceName) -> String {
        format!("{}:{}", self.key_prefix, service_name)
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Unavailable(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl JobSubmitter for RedisJobQueue {
    async fn submit(&self, submission: &JobSubmission) -> AppResult<JobHandle> {
        let job = QueuedJob {
            job_id: uuid::Uuid::new_v4().to_string(),
            audit_record_id: submission.audit_record_id,
            service_name: submission.service_name.clone(),
            entity: submission.entity,
            attributes: submission.attributes.clone(),
            enqueued_at: Utc::now(),
        };
        let payload = serde_json::to_string(&job).map_err(|error| {
            AppError::Internal(format!("failed to encode queued job '{}': {error}", job.job_id))
        })?;
        let queue = self.key_for(&submission.service_name);

        let mut connection = self.connection().await?;
        let _: i64 = connection
            .lpush(&queue, &payload)
            .await
            .map_err(|error| {
                AppError::Unavailable(format!(
                    "failed to push job '{}' to queue '{queue}': {error}",
                    job.job_id
                ))
            })?;

        Ok(JobHandle {
            job_id: job.job_id,
            queue,
            receipt: payload,
        })
    }

    async fn withdraw(&self, handle: &JobHandle) -> AppResult<()> {
        let mut connection = self.connection().await?;
        let removed: i64 = connection
            .lrem(&handle.queue, 1, &handle.receipt)
            .await
            .map_err(|error| {
                AppError::Unavailable(format!(
                    "failed to withdraw job '{}' from queue '{}': {error}",
                    handle.job_id, handle.queue
                ))
            })?;

        if removed == 0 {
            warn!(
                job_id = %handle.job_id,
                queue = %handle.queue,
                "withdrawn job was already taken by a worker"
            );
        }

        Ok(())
    }
}

#[async_trait]
impl JobSource for RedisJobQueue {
    async fn next_job(
        &self,
        service_names: &[ServiceName],
        wait_seconds: u32,
    ) -> AppResult<Option<QueuedJob>> {
        if service_names.is_empty() {
            return Err(AppError::Validation(
                "at least one service must be polled".to_owned(),
            ));
        }

        let keys: Vec<String> = service_names
            .iter()
            .map(|service_name| self.key_for(service_name))
            .collect();
        let mut connection = self.connection().await?;
        let popped: Option<(String, String)> = connection
            .brpop(&keys, f64::from(wait_seconds))
            .await
            .map_err(|error| AppError::Unavailable(format!("failed to poll job queues: {error}")))?;

        popped
            .map(|(queue, payload)| {
                serde_json::from_str::<QueuedJob>(&payload).map_err(|error| {
                    AppError::Internal(format!("invalid job payload in queue '{queue}': {error}"))
                })
            })
            .transpose()
    }
}
