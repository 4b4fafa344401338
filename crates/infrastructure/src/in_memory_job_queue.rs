use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use enrichly_application::{JobHandle, JobSource, JobSubmission, JobSubmitter, QueuedJob};
use enrichly_core::AppResult;
use enrichly_domain::ServiceName;
use tokio::sync::{Mutex, Notify};

/// In-process job queue with one FIFO per service.
#[derive(Default)]
pub struct InMemoryJobQueue {
    queues: Mutex<HashMap<ServiceName, VecDeque<QueuedJob>>>,
    notify: Notify,
}

impl InMemoryJobQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns queued jobs for one service.
    pub async fn queued_len(&self, service_name: &ServiceName) -> usize {
        self.queues
            .lock()
            .await
            .get(service_name)
            .map_or(0, VecDeque::len)
    }

    async fn pop_first(&self, service_names: &[ServiceName]) -> Option<QueuedJob> {
        let mut queues = self.queues.lock().await;
        service_names
            .iter()
            .find_map(|service_name| queues.get_mut(service_name)?.pop_front())
    }
}

#[async_trait]
impl JobSubmitter for InMemoryJobQueue {
    async fn submit(&self, submission: &JobSubmission) -> AppResult<JobHandle> {
        let job = QueuedJob {
            job_id: uuid::Uuid::new_v4().to_string(),
            audit_record_id: submission.audit_record_id,
            service_name: submission.service_name.clone(),
            entity: submission.entity,
            attributes: submission.attributes.clone(),
            enqueued_at: Utc::now(),
        };
        let handle = JobHandle {
            job_id: job.job_id.clone(),
            queue: submission.service_name.as_str().to_owned(),
            receipt: job.job_id.clone(),
        };

        self.queues
            .lock()
            .await
            .entry(submission.service_name.clone())
            .or_default()
            .push_back(job);
        self.notify.notify_waiters();

        Ok(handle)
    }

    async fn withdraw(&self, handle: &JobHandle) -> AppResult<()> {
        let mut queues = self.queues.lock().await;
        for queue in queues.values_mut() {
            queue.retain(|job| job.job_id != handle.receipt);
        }

        Ok(())
    }
}

#[async_trait]
impl JobSource for InMemoryJobQueue {
    async fn next_job(
        &self,
        service_names: &[ServiceName],
        wait_seconds: u32,
    ) -> AppResult<Option<QueuedJob>> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(u64::from(wait_seconds));

        loop {
            let notified = self.notify.notified();
            if let Some(job) = self.pop_first(service_names).await {
                return Ok(Some(job));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(self.pop_first(service_names).await);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use enrichly_application::{JobSource, JobSubmission, JobSubmitter};
    use enrichly_domain::{AuditRecordId, EntityId, EntityRef, EntityType, ServiceName};
    use serde_json::json;

    use super::InMemoryJobQueue;

    fn submission(service_name: &str) -> JobSubmission {
        JobSubmission {
            audit_record_id: AuditRecordId::new(),
            service_name: ServiceName::new(service_name).unwrap_or_else(|_| unreachable!()),
            entity: EntityRef::new(EntityType::Domain, EntityId::new()),
            attributes: json!({"domain": "example.com"}),
        }
    }

    #[tokio::test]
    async fn jobs_are_consumed_in_submission_order() {
        let queue = InMemoryJobQueue::new();
        let first = submission("domain_testing");
        let second = submission("domain_testing");
        assert!(queue.submit(&first).await.is_ok());
        assert!(queue.submit(&second).await.is_ok());

        let services = [first.service_name.clone()];
        let job = queue.next_job(&services, 0).await;
        assert!(matches!(job, Ok(Some(ref job)) if job.audit_record_id == first.audit_record_id));
        let job = queue.next_job(&services, 0).await;
        assert!(matches!(job, Ok(Some(ref job)) if job.audit_record_id == second.audit_record_id));
        assert!(matches!(queue.next_job(&services, 0).await, Ok(None)));
    }

    #[tokio::test]
    async fn withdrawn_jobs_are_never_delivered() {
        let queue = InMemoryJobQueue::new();
        let pending = submission("domain_mx_testing");
        let handle = queue.submit(&pending).await;
        assert!(handle.is_ok());
        let handle = handle.unwrap_or_else(|_| unreachable!());

        assert!(queue.withdraw(&handle).await.is_ok());
        assert_eq!(queue.queued_len(&pending.service_name).await, 0);
    }

    #[tokio::test]
    async fn waiting_consumer_receives_later_submission() {
        let queue = std::sync::Arc::new(InMemoryJobQueue::new());
        let pending = submission("domain_testing");
        let services = vec![pending.service_name.clone()];

        let consumer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.next_job(&services, 5).await })
        };
        tokio::task::yield_now().await;
        assert!(queue.submit(&pending).await.is_ok());

        let received = consumer.await;
        assert!(received.is_ok());
        let received = received.unwrap_or_else(|_| unreachable!());
        assert!(
            matches!(received, Ok(Some(job)) if job.audit_record_id == pending.audit_record_id)
        );
    }
}
