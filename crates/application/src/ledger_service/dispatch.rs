use std::collections::HashMap;

use enrichly_domain::EntityId;

use super::*;

impl ServiceDispatchLedger {
    /// Claims up to `requested_count` candidates and submits one job per claim.
    ///
    /// Claims lost to a concurrent dispatcher are skipped. When any submission
    /// fails, jobs already submitted by this call are withdrawn and every
    /// pending record it created is released before the error is returned.
    pub async fn dispatch(
        &self,
        service_name: &str,
        requested_count: i64,
        scope: &DispatchScope,
    ) -> AppResult<DispatchBatch> {
        let effective_count = effective_batch_size(requested_count)?;
        let service_name = ServiceName::new(service_name)?;
        let service = self.require_service(&service_name).await?;

        if !service.is_active() {
            info!(
                service_name = %service_name,
                "skipping dispatch for inactive enrichment service"
            );
            return Ok(DispatchBatch {
                service_name,
                requested_count,
                effective_count,
                available_count: 0,
                entity_ids: Vec::new(),
            });
        }

        let candidates = self.load_candidates(service, scope).await?;
        let available_count = candidates.len();
        let claimed = self
            .claim_candidates(&candidates, &service_name, effective_count)
            .await?;

        let attributes_by_entity: HashMap<EntityId, &EntityRecord> = candidates
            .iter()
            .map(|record| (record.entity().entity_id, record))
            .collect();

        let mut handles: Vec<JobHandle> = Vec::with_capacity(claimed.len());
        for record in &claimed {
            let attributes = attributes_by_entity
                .get(&record.entity().entity_id)
                .map(|entity| entity.attributes_value())
                .unwrap_or_default();
            let submission = JobSubmission {
                audit_record_id: record.id(),
                service_name: service_name.clone(),
                entity: record.entity(),
                attributes,
            };

            match self.job_submitter.submit(&submission).await {
                Ok(handle) => handles.push(handle),
                Err(error) => {
                    let error = match error {
                        AppError::Unavailable(message) => AppError::Unavailable(message),
                        other => AppError::Unavailable(format!("job submission failed: {other}")),
                    };
                    return Err(self.roll_back(&service_name, &handles, &claimed, error).await);
                }
            }
        }

        if !claimed.is_empty() {
            self.invalidate_counters(&service_name).await;
        }

        info!(
            service_name = %service_name,
            requested_count,
            effective_count,
            available_count,
            queued_count = claimed.len(),
            scope = %scope.cache_key(),
            "dispatched enrichment batch"
        );

        Ok(DispatchBatch {
            service_name,
            requested_count,
            effective_count,
            available_count,
            entity_ids: claimed
                .iter()
                .map(|record| record.entity().entity_id)
                .collect(),
        })
    }

    async fn claim_candidates(
        &self,
        candidates: &Candidates,
        service_name: &ServiceName,
        effective_count: usize,
    ) -> AppResult<Vec<AuditRecord>> {
        let mut pool = candidates.iter();
        let mut claimed: Vec<AuditRecord> = Vec::with_capacity(effective_count);

        while claimed.len() < effective_count {
            let started_at = Utc::now();
            let chunk: Vec<AuditRecord> = pool
                .by_ref()
                .take(effective_count - claimed.len())
                .map(|record| {
                    AuditRecord::pending(record.entity(), service_name.clone(), started_at)
                })
                .collect();

            if chunk.is_empty() {
                break;
            }

            let attempted = chunk.len();
            match self.repository.claim_pending(chunk).await {
                Ok(stored) => {
                    if stored.len() < attempted {
                        info!(
                            service_name = %service_name,
                            skipped = attempted - stored.len(),
                            "skipped candidates already claimed by a concurrent dispatch"
                        );
                    }
                    claimed.extend(stored);
                }
                Err(error) => {
                    return Err(self.roll_back(service_name, &[], &claimed, error).await);
                }
            }
        }

        Ok(claimed)
    }

    async fn roll_back(
        &self,
        service_name: &ServiceName,
        handles: &[JobHandle],
        claimed: &[AuditRecord],
        error: AppError,
    ) -> AppError {
        for handle in handles {
            if let Err(withdraw_error) = self.job_submitter.withdraw(handle).await {
                warn!(
                    service_name = %service_name,
                    job_id = %handle.job_id,
                    error = %withdraw_error,
                    "failed to withdraw submitted job during dispatch rollback"
                );
            }
        }

        let record_ids: Vec<AuditRecordId> = claimed.iter().map(AuditRecord::id).collect();
        if record_ids.is_empty() {
            return error;
        }

        match self.repository.release_pending(&record_ids).await {
            Ok(released) => {
                warn!(
                    service_name = %service_name,
                    withdrawn = handles.len(),
                    released,
                    error = %error,
                    "rolled back enrichment dispatch"
                );
                self.invalidate_counters(service_name).await;
                error
            }
            Err(release_error) => AppError::Internal(format!(
                "{error}; additionally failed to release pending claims: {release_error}"
            )),
        }
    }
}
