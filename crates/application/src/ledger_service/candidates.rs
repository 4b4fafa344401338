use chrono::{DateTime, Duration, Utc};
use enrichly_domain::EntityId;

use crate::ledger_ports::LedgerSnapshot;

use super::*;

/// Candidate enumeration for one service and scope over one snapshot.
///
/// Iteration is lazy and can be restarted; every pass yields the same entities
/// in snapshot order.
#[derive(Debug, Clone)]
pub struct Candidates {
    service: ServiceDefinition,
    scope: DispatchScope,
    snapshot: LedgerSnapshot,
}

impl Candidates {
    pub(super) fn new(
        service: ServiceDefinition,
        scope: DispatchScope,
        snapshot: LedgerSnapshot,
    ) -> Self {
        Self {
            service,
            scope,
            snapshot,
        }
    }

    /// Returns the service the candidates belong to.
    #[must_use]
    pub fn service(&self) -> &ServiceDefinition {
        &self.service
    }

    /// Returns the scope the candidates were filtered with.
    #[must_use]
    pub fn scope(&self) -> &DispatchScope {
        &self.scope
    }

    /// Returns the snapshot timestamp.
    #[must_use]
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.snapshot.taken_at
    }

    /// Starts a new pass over the candidates.
    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> + '_ {
        self.in_scope().filter(|record| self.needs_service(record))
    }

    /// Returns the candidate pool size.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns whether no entity needs the service.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Derives counters from the same snapshot the candidates come from.
    ///
    /// An entity whose last success has aged past the refresh interval counts
    /// as needing, not completed, so `needing + completed` never exceeds the
    /// entities in scope.
    #[must_use]
    pub fn counters(&self) -> ServiceCounters {
        let mut counters = ServiceCounters::default();
        for record in self.in_scope() {
            let entity_id = record.entity().entity_id;
            if self.snapshot.pending.contains(&entity_id) {
                counters.pending += 1;
            }
            if self.has_fresh_success(entity_id) {
                counters.completed += 1;
            }
            if self.needs_service(record) {
                counters.needing += 1;
            }
        }

        counters
    }

    fn in_scope(&self) -> impl Iterator<Item = &EntityRecord> + '_ {
        self.snapshot.entities.iter().filter(|record| {
            record.entity().entity_type == self.service.entity_type()
                && self.scope.contains(record)
        })
    }

    fn needs_service(&self, record: &EntityRecord) -> bool {
        let entity_id = record.entity().entity_id;

        self.service.is_active()
            && !self.snapshot.pending.contains(&entity_id)
            && !self.has_fresh_success(entity_id)
            && self.service.eligibility().matches(record)
    }

    fn has_fresh_success(&self, entity_id: EntityId) -> bool {
        let Some(completed_at) = self.snapshot.last_success.get(&entity_id) else {
            return false;
        };

        match self.service.refresh_interval_hours() {
            None => true,
            Some(hours) => {
                *completed_at > self.snapshot.taken_at - Duration::hours(i64::from(hours))
            }
        }
    }
}

impl<'a> IntoIterator for &'a Candidates {
    type Item = &'a EntityRecord;
    type IntoIter = Box<dyn Iterator<Item = &'a EntityRecord> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl ServiceDispatchLedger {
    /// Returns the entities that currently need one service within a scope.
    pub async fn candidates(
        &self,
        service_name: &str,
        scope: &DispatchScope,
    ) -> AppResult<Candidates> {
        let service_name = ServiceName::new(service_name)?;
        let service = self.require_service(&service_name).await?;
        self.load_candidates(service, scope).await
    }

    pub(super) async fn load_candidates(
        &self,
        service: ServiceDefinition,
        scope: &DispatchScope,
    ) -> AppResult<Candidates> {
        let snapshot = self.repository.load_snapshot(&service).await?;
        Ok(Candidates::new(service, scope.clone(), snapshot))
    }
}
