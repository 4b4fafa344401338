use chrono::{DateTime, Utc};
use enrichly_domain::{AuditStatus, CompletionOutcome, EntityRef, ServiceName};
use serde_json::{Map, Value};

/// Worker-reported completion for one dispatched entity.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteDispatchInput {
    /// Entity the work ran against.
    pub entity: EntityRef,
    /// Service that ran.
    pub service_name: String,
    /// Terminal outcome.
    pub outcome: CompletionOutcome,
    /// Diagnostic payload merged into the audit record.
    pub metadata: Map<String, Value>,
    /// Failure details for failed outcomes.
    pub error_message: Option<String>,
    /// Entity attribute patch applied with the transition.
    pub attribute_updates: Option<Map<String, Value>>,
}

/// Repository payload for one pending-to-terminal transition.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletePendingInput {
    /// Entity the work ran against.
    pub entity: EntityRef,
    /// Service that ran.
    pub service_name: ServiceName,
    /// Terminal outcome.
    pub outcome: CompletionOutcome,
    /// Completion timestamp.
    pub completed_at: DateTime<Utc>,
    /// Diagnostic payload merged into the audit record.
    pub metadata: Map<String, Value>,
    /// Failure details.
    pub error_message: Option<String>,
    /// Entity attribute patch applied in the same transaction.
    pub attribute_updates: Option<Map<String, Value>>,
}

/// Audit trail listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecordQuery {
    /// Optional entity filter.
    pub entity: Option<EntityRef>,
    /// Optional service filter.
    pub service_name: Option<ServiceName>,
    /// Optional status filter.
    pub status: Option<AuditStatus>,
    /// Page size.
    pub limit: usize,
    /// Row offset.
    pub offset: usize,
}

/// Operator changes to one service definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateServiceSettingsInput {
    /// New active flag.
    pub is_active: Option<bool>,
    /// New default batch size.
    pub default_batch_size: Option<u32>,
    /// New refresh interval; `Some(None)` clears it.
    pub refresh_interval_hours: Option<Option<u32>>,
}
