use enrichly_application::{AuditRecordQuery, DEFAULT_AUDIT_TRAIL_LIMIT};
use enrichly_core::AppError;
use enrichly_domain::{AuditRecord, AuditStatus, EntityId, EntityRef, EntityType, ServiceName};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Audit trail filters; `entity_type` and `entity_id` go together.
#[derive(Debug, Default, Deserialize)]
pub struct AuditRecordsQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub service_name: Option<String>,
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl TryFrom<AuditRecordsQuery> for AuditRecordQuery {
    type Error = AppError;

    fn try_from(value: AuditRecordsQuery) -> Result<Self, Self::Error> {
        let entity = match (value.entity_type, value.entity_id) {
            (None, None) => None,
            (Some(entity_type), Some(entity_id)) => Some(EntityRef::new(
                EntityType::parse(entity_type.as_str())?,
                EntityId::parse(entity_id.as_str())?,
            )),
            _ => {
                return Err(AppError::Validation(
                    "entity_type and entity_id must be provided together".to_owned(),
                ));
            }
        };

        Ok(Self {
            entity,
            service_name: value.service_name.map(ServiceName::new).transpose()?,
            status: value
                .status
                .as_deref()
                .map(AuditStatus::parse)
                .transpose()?,
            limit: value.limit.unwrap_or(DEFAULT_AUDIT_TRAIL_LIMIT),
            offset: value.offset.unwrap_or(0),
        })
    }
}

/// API representation of one audit record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-record-response.ts"
)]
pub struct AuditRecordResponse {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub service_name: String,
    pub status: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    #[ts(type = "number | null")]
    pub duration_ms: Option<i64>,
    pub error_message: Option<String>,
    #[ts(type = "Record<string, unknown>")]
    pub metadata: Value,
}

impl From<AuditRecord> for AuditRecordResponse {
    fn from(value: AuditRecord) -> Self {
        let entity = value.entity();
        Self {
            id: value.id().to_string(),
            entity_type: entity.entity_type.as_str().to_owned(),
            entity_id: entity.entity_id.to_string(),
            service_name: value.service_name().as_str().to_owned(),
            status: value.status().as_str().to_owned(),
            started_at: value.started_at().to_rfc3339(),
            completed_at: value.completed_at().map(|timestamp| timestamp.to_rfc3339()),
            duration_ms: value.duration_ms(),
            error_message: value.error_message().map(ToOwned::to_owned),
            metadata: Value::Object(value.metadata().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use enrichly_application::AuditRecordQuery;
    use enrichly_core::AppError;
    use enrichly_domain::{AuditStatus, EntityType};

    use super::AuditRecordsQuery;

    #[test]
    fn parses_full_filter_set() {
        let query = AuditRecordQuery::try_from(AuditRecordsQuery {
            entity_type: Some("domain".to_owned()),
            entity_id: Some("0b0f6a0e-2a4c-4b8e-9a3d-8d1f0c7f4b11".to_owned()),
            service_name: Some("domain_testing".to_owned()),
            status: Some("failed".to_owned()),
            limit: Some(20),
            offset: Some(40),
        });
        assert!(query.is_ok());
        let query = query.unwrap_or_else(|_| unreachable!());
        assert_eq!(
            query.entity.map(|entity| entity.entity_type),
            Some(EntityType::Domain)
        );
        assert_eq!(query.status, Some(AuditStatus::Failed));
        assert_eq!(query.limit, 20);
        assert_eq!(query.offset, 40);
    }

    #[test]
    fn entity_filter_requires_both_parts() {
        let query = AuditRecordQuery::try_from(AuditRecordsQuery {
            entity_type: Some("domain".to_owned()),
            ..AuditRecordsQuery::default()
        });
        assert!(matches!(query, Err(AppError::Validation(_))));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let query = AuditRecordQuery::try_from(AuditRecordsQuery {
            status: Some("running".to_owned()),
            ..AuditRecordsQuery::default()
        });
        assert!(matches!(query, Err(AppError::Validation(_))));
    }
}
