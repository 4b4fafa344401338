use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuditRecord, AuditStatus, ServiceName};

const HEALTHY_SUCCESS_RATE: f64 = 95.0;
const HEALTHY_AVG_DURATION_MS: f64 = 5_000.0;
const ATTENTION_SUCCESS_RATE: f64 = 80.0;
const ATTENTION_AVG_DURATION_MS: f64 = 10_000.0;

/// Run statistics for one service aggregated over its audit records.
///
/// Durations cover successful runs only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePerformance {
    /// Service the statistics belong to.
    pub service_name: ServiceName,
    /// Dispatches still waiting for a worker.
    pub pending_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub avg_duration_ms: Option<f64>,
    pub min_duration_ms: Option<i64>,
    pub max_duration_ms: Option<i64>,
    /// Earliest dispatch start.
    pub first_run_at: Option<DateTime<Utc>>,
    /// Latest dispatch start.
    pub last_run_at: Option<DateTime<Utc>>,
}

impl ServicePerformance {
    /// Creates an empty aggregate.
    #[must_use]
    pub fn empty(service_name: ServiceName) -> Self {
        Self {
            service_name,
            pending_runs: 0,
            successful_runs: 0,
            failed_runs: 0,
            avg_duration_ms: None,
            min_duration_ms: None,
            max_duration_ms: None,
            first_run_at: None,
            last_run_at: None,
        }
    }

    /// Folds audit records of this service into an aggregate.
    ///
    /// Records of other services are ignored.
    #[must_use]
    pub fn from_records<'a>(
        service_name: ServiceName,
        records: impl IntoIterator<Item = &'a AuditRecord>,
    ) -> Self {
        let mut performance = Self::empty(service_name.clone());
        let mut duration_total: i128 = 0;
        let mut duration_count: u64 = 0;

        for record in records
            .into_iter()
            .filter(|record| record.service_name() == &service_name)
        {
            match record.status() {
                AuditStatus::Pending => performance.pending_runs += 1,
                AuditStatus::Failed => performance.failed_runs += 1,
                AuditStatus::Success => {
                    performance.successful_runs += 1;
                    if let Some(duration_ms) = record.duration_ms() {
                        duration_total += i128::from(duration_ms);
                        duration_count += 1;
                        performance.min_duration_ms = Some(
                            performance
                                .min_duration_ms
                                .map_or(duration_ms, |current| current.min(duration_ms)),
                        );
                        performance.max_duration_ms = Some(
                            performance
                                .max_duration_ms
                                .map_or(duration_ms, |current| current.max(duration_ms)),
                        );
                    }
                }
            }

            let started_at = record.started_at();
            performance.first_run_at = Some(
                performance
                    .first_run_at
                    .map_or(started_at, |current| current.min(started_at)),
            );
            performance.last_run_at = Some(
                performance
                    .last_run_at
                    .map_or(started_at, |current| current.max(started_at)),
            );
        }

        if duration_count > 0 {
            performance.avg_duration_ms = Some(duration_total as f64 / duration_count as f64);
        }

        performance
    }

    /// Returns every recorded run, pending included.
    #[must_use]
    pub fn total_runs(&self) -> u64 {
        self.pending_runs + self.successful_runs + self.failed_runs
    }

    /// Returns runs that reached a terminal status.
    #[must_use]
    pub fn finished_runs(&self) -> u64 {
        self.successful_runs + self.failed_runs
    }

    /// Successful share of finished runs, rounded to one decimal.
    #[must_use]
    pub fn success_rate_percent(&self) -> f64 {
        let finished = self.finished_runs();
        if finished == 0 {
            return 0.0;
        }

        let rate = self.successful_runs as f64 * 100.0 / finished as f64;
        (rate * 10.0).round() / 10.0
    }

    /// High success rate and fast successful runs.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.finished_runs() > 0
            && self.success_rate_percent() >= HEALTHY_SUCCESS_RATE
            && self
                .avg_duration_ms
                .is_none_or(|avg| avg <= HEALTHY_AVG_DURATION_MS)
    }

    /// Low success rate or slow successful runs. A service with no finished
    /// runs is never flagged.
    #[must_use]
    pub fn needs_attention(&self) -> bool {
        self.finished_runs() > 0
            && (self.success_rate_percent() < ATTENTION_SUCCESS_RATE
                || self
                    .avg_duration_ms
                    .is_some_and(|avg| avg > ATTENTION_AVG_DURATION_MS))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::Map;

    use crate::{
        AuditRecord, AuditRecordId, AuditRecordParts, AuditStatus, EntityId, EntityRef,
        EntityType, ServiceName,
    };

    use super::ServicePerformance;

    fn service_name(value: &str) -> ServiceName {
        ServiceName::new(value).unwrap_or_else(|_| unreachable!())
    }

    fn record(service: &str, status: AuditStatus, duration_ms: Option<i64>) -> AuditRecord {
        let started_at = Utc::now() - Duration::minutes(5);
        AuditRecord::from_parts(AuditRecordParts {
            id: AuditRecordId::new(),
            entity: EntityRef::new(EntityType::Domain, EntityId::new()),
            service_name: service_name(service),
            status,
            started_at,
            completed_at: status.is_terminal().then(Utc::now),
            duration_ms: status.is_terminal().then_some(duration_ms).flatten(),
            error_message: None,
            metadata: Map::new(),
        })
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn aggregates_runs_and_success_durations() {
        let records = vec![
            record("domain_testing", AuditStatus::Success, Some(100)),
            record("domain_testing", AuditStatus::Success, Some(300)),
            record("domain_testing", AuditStatus::Failed, Some(9_000)),
            record("domain_testing", AuditStatus::Pending, None),
            record("domain_mx_testing", AuditStatus::Success, Some(50)),
        ];

        let performance =
            ServicePerformance::from_records(service_name("domain_testing"), &records);

        assert_eq!(performance.total_runs(), 4);
        assert_eq!(performance.successful_runs, 2);
        assert_eq!(performance.failed_runs, 1);
        assert_eq!(performance.pending_runs, 1);
        assert_eq!(performance.avg_duration_ms, Some(200.0));
        assert_eq!(performance.min_duration_ms, Some(100));
        assert_eq!(performance.max_duration_ms, Some(300));
        assert_eq!(performance.success_rate_percent(), 66.7);
        assert!(performance.last_run_at.is_some());
        assert!(!performance.is_healthy());
        assert!(performance.needs_attention());
    }

    #[test]
    fn empty_service_is_neither_healthy_nor_flagged() {
        let performance = ServicePerformance::from_records(service_name("domain_testing"), &[]);

        assert_eq!(performance.success_rate_percent(), 0.0);
        assert!(performance.avg_duration_ms.is_none());
        assert!(!performance.is_healthy());
        assert!(!performance.needs_attention());
    }

    #[test]
    fn slow_successful_service_needs_attention() {
        let records = vec![record(
            "domain_web_content_extraction",
            AuditStatus::Success,
            Some(12_000),
        )];
        let performance = ServicePerformance::from_records(
            service_name("domain_web_content_extraction"),
            &records,
        );

        assert_eq!(performance.success_rate_percent(), 100.0);
        assert!(!performance.is_healthy());
        assert!(performance.needs_attention());
    }
}
