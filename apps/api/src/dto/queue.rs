use enrichly_domain::{DispatchBatch, EntityId, ServiceCounters, ServiceName};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for queueing one enrichment batch.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/dispatch-queue-request.ts"
)]
pub struct DispatchQueueRequest {
    /// Falls back to the service's default batch size when omitted.
    #[ts(type = "number | null")]
    pub count: Option<i64>,
    pub country: Option<String>,
}

/// Outcome of one queue request.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/dispatch-queue-response.ts"
)]
pub struct DispatchQueueResponse {
    pub success: bool,
    pub message: String,
    pub queued_count: usize,
    #[ts(type = "number")]
    pub requested_count: i64,
    pub available_count: usize,
    pub entity_ids: Vec<String>,
}

impl From<DispatchBatch> for DispatchQueueResponse {
    fn from(value: DispatchBatch) -> Self {
        let queued_count = value.queued_count();
        let message = if value.is_empty() {
            format!("No entities need {}", value.service_name)
        } else if queued_count < value.effective_count {
            format!(
                "Queued {queued_count} of {} requested entities for {}",
                value.requested_count, value.service_name
            )
        } else {
            format!(
                "Successfully queued {queued_count} entities for {}",
                value.service_name
            )
        };

        Self {
            success: !value.is_empty(),
            message,
            queued_count,
            requested_count: value.requested_count,
            available_count: value.available_count,
            entity_ids: value.entity_ids.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Optional country scope shared by queue read endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub country: Option<String>,
}

/// Consistent counters for one service and scope.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/queue-status-response.ts"
)]
pub struct QueueStatusResponse {
    pub service_name: String,
    #[ts(type = "number")]
    pub needing: u64,
    #[ts(type = "number")]
    pub pending: u64,
    #[ts(type = "number")]
    pub completed: u64,
    pub completion_percentage: f64,
}

impl QueueStatusResponse {
    pub fn new(service_name: &ServiceName, counters: ServiceCounters) -> Self {
        Self {
            service_name: service_name.as_str().to_owned(),
            needing: counters.needing,
            pending: counters.pending,
            completed: counters.completed,
            completion_percentage: counters.completion_percentage(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidatesQuery {
    pub country: Option<String>,
    pub limit: Option<usize>,
}

/// Preview of the entities the next dispatch would pick.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/candidates-response.ts"
)]
pub struct CandidatesResponse {
    pub service_name: String,
    pub total: usize,
    pub entity_ids: Vec<String>,
}

impl CandidatesResponse {
    pub fn new(
        service_name: &ServiceName,
        total: usize,
        entity_ids: impl Iterator<Item = EntityId>,
    ) -> Self {
        Self {
            service_name: service_name.as_str().to_owned(),
            total,
            entity_ids: entity_ids
                .map(|entity_id| entity_id.to_string())
                .collect(),
        }
    }
}
