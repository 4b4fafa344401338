use enrichly_application::UpdateServiceSettingsInput;
use enrichly_domain::{ServiceDefinition, ServicePerformance};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// API representation of one configured enrichment service.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/service-response.ts"
)]
pub struct ServiceResponse {
    pub service_name: String,
    pub display_name: String,
    pub entity_type: String,
    pub is_active: bool,
    pub default_batch_size: u32,
    pub refresh_interval_hours: Option<u32>,
    #[ts(type = "Record<string, unknown>")]
    pub eligibility: Value,
}

impl From<ServiceDefinition> for ServiceResponse {
    fn from(value: ServiceDefinition) -> Self {
        Self {
            service_name: value.service_name().as_str().to_owned(),
            display_name: value.display_name().as_str().to_owned(),
            entity_type: value.entity_type().as_str().to_owned(),
            is_active: value.is_active(),
            default_batch_size: value.default_batch_size(),
            refresh_interval_hours: value.refresh_interval_hours(),
            eligibility: serde_json::to_value(value.eligibility()).unwrap_or(Value::Null),
        }
    }
}

/// Run statistics for one service.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/service-performance-response.ts"
)]
pub struct ServicePerformanceResponse {
    pub service_name: String,
    #[ts(type = "number")]
    pub total_runs: u64,
    #[ts(type = "number")]
    pub pending_runs: u64,
    #[ts(type = "number")]
    pub successful_runs: u64,
    #[ts(type = "number")]
    pub failed_runs: u64,
    pub success_rate_percent: f64,
    pub avg_duration_ms: Option<f64>,
    #[ts(type = "number | null")]
    pub min_duration_ms: Option<i64>,
    #[ts(type = "number | null")]
    pub max_duration_ms: Option<i64>,
    pub first_run_at: Option<String>,
    pub last_run_at: Option<String>,
    pub healthy: bool,
    pub needs_attention: bool,
}

impl From<ServicePerformance> for ServicePerformanceResponse {
    fn from(value: ServicePerformance) -> Self {
        Self {
            service_name: value.service_name.as_str().to_owned(),
            total_runs: value.total_runs(),
            pending_runs: value.pending_runs,
            successful_runs: value.successful_runs,
            failed_runs: value.failed_runs,
            success_rate_percent: value.success_rate_percent(),
            avg_duration_ms: value.avg_duration_ms,
            min_duration_ms: value.min_duration_ms,
            max_duration_ms: value.max_duration_ms,
            first_run_at: value.first_run_at.map(|value| value.to_rfc3339()),
            last_run_at: value.last_run_at.map(|value| value.to_rfc3339()),
            healthy: value.is_healthy(),
            needs_attention: value.needs_attention(),
        }
    }
}

/// Incoming payload for operator service settings.
///
/// `refresh_interval_hours: null` clears the interval; omitting it keeps the
/// stored value.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-service-settings-request.ts"
)]
pub struct UpdateServiceSettingsRequest {
    pub is_active: Option<bool>,
    pub default_batch_size: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_present")]
    #[ts(type = "number | null")]
    pub refresh_interval_hours: Option<Option<u32>>,
}

impl From<UpdateServiceSettingsRequest> for UpdateServiceSettingsInput {
    fn from(value: UpdateServiceSettingsRequest) -> Self {
        Self {
            is_active: value.is_active,
            default_batch_size: value.default_batch_size,
            refresh_interval_hours: value.refresh_interval_hours,
        }
    }
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<u32>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u32>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::UpdateServiceSettingsRequest;

    #[test]
    fn refresh_interval_distinguishes_null_from_absent() {
        let cleared: UpdateServiceSettingsRequest =
            serde_json::from_str(r#"{"refresh_interval_hours": null}"#)
                .unwrap_or_else(|_| unreachable!());
        assert_eq!(cleared.refresh_interval_hours, Some(None));

        let untouched: UpdateServiceSettingsRequest =
            serde_json::from_str(r#"{"is_active": false}"#).unwrap_or_else(|_| unreachable!());
        assert_eq!(untouched.refresh_interval_hours, None);
        assert_eq!(untouched.is_active, Some(false));

        let set: UpdateServiceSettingsRequest =
            serde_json::from_str(r#"{"refresh_interval_hours": 24}"#)
                .unwrap_or_else(|_| unreachable!());
        assert_eq!(set.refresh_interval_hours, Some(Some(24)));
    }
}
