use super::*;

impl ServiceDispatchLedger {
    /// Transitions the pending record of one entity and service to a terminal status.
    ///
    /// A second completion for the same dispatch finds no pending record and
    /// returns `NotFound`.
    pub async fn complete(&self, input: CompleteDispatchInput) -> AppResult<AuditRecord> {
        let service_name = ServiceName::new(input.service_name)?;
        let service = self.require_service(&service_name).await?;

        if service.entity_type() != input.entity.entity_type {
            return Err(AppError::Validation(format!(
                "service '{}' runs against '{}' entities, not '{}'",
                service_name,
                service.entity_type(),
                input.entity.entity_type
            )));
        }

        let entity = input.entity;
        let outcome = input.outcome;
        let completed = self
            .repository
            .complete_pending(CompletePendingInput {
                entity,
                service_name: service_name.clone(),
                outcome,
                completed_at: Utc::now(),
                metadata: input.metadata,
                error_message: input.error_message,
                attribute_updates: input.attribute_updates,
            })
            .await;

        let record = match completed {
            Ok(record) => record,
            Err(AppError::NotFound(message)) => {
                warn!(
                    service_name = %service_name,
                    entity = %entity,
                    "completion without a pending dispatch"
                );
                return Err(AppError::NotFound(message));
            }
            Err(error) => return Err(error),
        };

        self.invalidate_counters(&service_name).await;

        info!(
            service_name = %service_name,
            entity = %entity,
            status = record.status().as_str(),
            duration_ms = record.duration_ms().unwrap_or_default(),
            "completed enrichment dispatch"
        );

        Ok(record)
    }
}
