use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use enrichly_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{EntityRef, ServiceName};

/// Identifier of one audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuditRecordId(Uuid);

impl AuditRecordId {
    /// Creates a random audit record identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AuditRecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AuditRecordId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle status of one unit of enrichment work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    /// Dispatched and in flight.
    Pending,
    /// Completed successfully.
    Success,
    /// Completed with a failure.
    Failed,
}

impl AuditStatus {
    /// Returns stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Parses storage value.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            _ => Err(AppError::Validation(format!(
                "unknown audit status '{value}'"
            ))),
        }
    }

    /// Returns whether the status is final.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Terminal outcome reported by a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionOutcome {
    /// Work succeeded.
    Success,
    /// Work failed.
    Failed,
}

impl CompletionOutcome {
    /// Returns the terminal audit status for this outcome.
    #[must_use]
    pub fn status(&self) -> AuditStatus {
        match self {
            Self::Success => AuditStatus::Success,
            Self::Failed => AuditStatus::Failed,
        }
    }
}

/// Persisted fact about one attempted unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    id: AuditRecordId,
    entity: EntityRef,
    service_name: ServiceName,
    status: AuditStatus,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    duration_ms: Option<i64>,
    error_message: Option<String>,
    metadata: Map<String, Value>,
}

/// Fields used to rebuild an audit record from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecordParts {
    /// Record identifier.
    pub id: AuditRecordId,
    /// Target entity.
    pub entity: EntityRef,
    /// Service name.
    pub service_name: ServiceName,
    /// Current status.
    pub status: AuditStatus,
    /// Dispatch timestamp.
    pub started_at: DateTime<Utc>,
    /// Completion timestamp for terminal records.
    pub completed_at: Option<DateTime<Utc>>,
    /// Elapsed milliseconds for terminal records.
    pub duration_ms: Option<i64>,
    /// Failure details.
    pub error_message: Option<String>,
    /// Diagnostic payload.
    pub metadata: Map<String, Value>,
}

impl AuditRecord {
    /// Creates a new pending record for a dispatch.
    #[must_use]
    pub fn pending(entity: EntityRef, service_name: ServiceName, started_at: DateTime<Utc>) -> Self {
        Self {
            id: AuditRecordId::new(),
            entity,
            service_name,
            status: AuditStatus::Pending,
            started_at,
            completed_at: None,
            duration_ms: None,
            error_message: None,
            metadata: Map::new(),
        }
    }

    /// Rebuilds a record and checks the completion invariant.
    pub fn from_parts(parts: AuditRecordParts) -> AppResult<Self> {
        if parts.status.is_terminal() != parts.completed_at.is_some() {
            return Err(AppError::Validation(format!(
                "audit record '{}' with status '{}' has inconsistent completed_at",
                parts.id,
                parts.status.as_str()
            )));
        }

        Ok(Self {
            id: parts.id,
            entity: parts.entity,
            service_name: parts.service_name,
            status: parts.status,
            started_at: parts.started_at,
            completed_at: parts.completed_at,
            duration_ms: parts.duration_ms,
            error_message: parts.error_message,
            metadata: parts.metadata,
        })
    }

    /// Returns a terminal copy of this pending record.
    ///
    /// Terminal records cannot transition again.
    pub fn complete(
        &self,
        outcome: CompletionOutcome,
        completed_at: DateTime<Utc>,
        error_message: Option<String>,
        metadata: &Map<String, Value>,
    ) -> AppResult<Self> {
        if self.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "audit record '{}' is already '{}'",
                self.id,
                self.status.as_str()
            )));
        }

        let mut merged_metadata = self.metadata.clone();
        for (key, value) in metadata {
            merged_metadata.insert(key.clone(), value.clone());
        }

        let duration_ms = (completed_at - self.started_at).num_milliseconds().max(0);
        let error_message = match outcome {
            CompletionOutcome::Success => None,
            CompletionOutcome::Failed => error_message,
        };

        Ok(Self {
            status: outcome.status(),
            completed_at: Some(completed_at),
            duration_ms: Some(duration_ms),
            error_message,
            metadata: merged_metadata,
            ..self.clone()
        })
    }

    /// Returns the record identifier.
    #[must_use]
    pub fn id(&self) -> AuditRecordId {
        self.id
    }

    /// Returns the target entity.
    #[must_use]
    pub fn entity(&self) -> EntityRef {
        self.entity
    }

    /// Returns the service name.
    #[must_use]
    pub fn service_name(&self) -> &ServiceName {
        &self.service_name
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> AuditStatus {
        self.status
    }

    /// Returns the dispatch timestamp.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the completion timestamp.
    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns elapsed milliseconds for terminal records.
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        self.duration_ms
    }

    /// Returns failure details.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Returns the diagnostic payload.
    #[must_use]
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }
}
