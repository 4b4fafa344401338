use async_trait::async_trait;
use chrono::{DateTime, Utc};
use enrichly_core::AppResult;
use enrichly_domain::{AuditRecordId, EntityRef, ServiceName};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Unit of work handed to the job queue.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSubmission {
    /// Pending audit record backing this job.
    pub audit_record_id: AuditRecordId,
    /// Service to run.
    pub service_name: ServiceName,
    /// Target entity.
    pub entity: EntityRef,
    /// Entity attributes at dispatch time.
    pub attributes: Value,
}

/// Receipt for one submitted job, used to withdraw it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    /// Queue-assigned job identifier.
    pub job_id: String,
    /// Queue the job was pushed to.
    pub queue: String,
    /// Adapter-specific payload needed for withdrawal.
    pub receipt: String,
}

/// Job payload as consumed by workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedJob {
    /// Queue-assigned job identifier.
    pub job_id: String,
    /// Pending audit record backing this job.
    pub audit_record_id: AuditRecordId,
    /// Service to run.
    pub service_name: ServiceName,
    /// Target entity.
    pub entity: EntityRef,
    /// Entity attributes at dispatch time.
    pub attributes: Value,
    /// Enqueue timestamp.
    pub enqueued_at: DateTime<Utc>,
}

/// Job submission port used by dispatch.
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    /// Submits one job to the queue for its service.
    async fn submit(&self, submission: &JobSubmission) -> AppResult<JobHandle>;

    /// Removes a previously submitted job that no worker has taken yet.
    async fn withdraw(&self, handle: &JobHandle) -> AppResult<()>;
}

/// Job consumption port used by workers.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Waits up to `wait_seconds` for the next job of any listed service.
    async fn next_job(
        &self,
        service_names: &[ServiceName],
        wait_seconds: u32,
    ) -> AppResult<Option<QueuedJob>>;
}
