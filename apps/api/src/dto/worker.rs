use enrichly_application::CompleteDispatchInput;
use enrichly_core::AppError;
use enrichly_domain::{CompletionOutcome, EntityId, EntityRef, EntityType};
use serde::Deserialize;
use serde_json::{Map, Value};
use ts_rs::TS;

/// Completion callback sent by a worker once per dispatched job.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/complete-job-request.ts"
)]
pub struct CompleteJobRequest {
    pub entity_type: String,
    pub entity_id: String,
    pub service_name: String,
    /// Either `success` or `failed`.
    pub outcome: String,
    #[ts(type = "Record<string, unknown> | null")]
    pub metadata: Option<Map<String, Value>>,
    pub error_message: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub attribute_updates: Option<Map<String, Value>>,
}

impl CompleteJobRequest {
    /// Converts the callback, stamping the reporting worker into the audit metadata.
    pub fn into_input(self, worker_id: &str) -> Result<CompleteDispatchInput, AppError> {
        let outcome = match self.outcome.as_str() {
            "success" => CompletionOutcome::Success,
            "failed" => CompletionOutcome::Failed,
            other => {
                return Err(AppError::Validation(format!(
                    "outcome must be either 'success' or 'failed', got '{other}'"
                )));
            }
        };

        let mut metadata = self.metadata.unwrap_or_default();
        metadata.insert("worker_id".to_owned(), Value::String(worker_id.to_owned()));

        Ok(CompleteDispatchInput {
            entity: EntityRef::new(
                EntityType::parse(self.entity_type.as_str())?,
                EntityId::parse(self.entity_id.as_str())?,
            ),
            service_name: self.service_name,
            outcome,
            metadata,
            error_message: self.error_message,
            attribute_updates: self.attribute_updates,
        })
    }
}
