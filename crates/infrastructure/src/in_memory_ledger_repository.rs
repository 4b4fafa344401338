use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use enrichly_application::{
    AuditRecordQuery, CompletePendingInput, EntityRepository, LedgerRepository, LedgerSnapshot,
};
use enrichly_core::{AppError, AppResult};
use enrichly_domain::{
    AuditRecord, AuditRecordId, AuditStatus, EntityId, EntityRecord, EntityRef, ServiceDefinition,
    ServiceName, ServicePerformance,
};
use tokio::sync::RwLock;

type PendingKey = (EntityRef, ServiceName);

#[derive(Default)]
struct LedgerState {
    entities: Vec<EntityRecord>,
    entity_positions: HashMap<EntityRef, usize>,
    records: Vec<AuditRecord>,
    record_positions: HashMap<AuditRecordId, usize>,
    pending: HashMap<PendingKey, AuditRecordId>,
}

impl LedgerState {
    fn push_record(&mut self, record: AuditRecord) {
        if record.status() == AuditStatus::Pending {
            self.pending.insert(
                (record.entity(), record.service_name().clone()),
                record.id(),
            );
        }
        self.record_positions.insert(record.id(), self.records.len());
        self.records.push(record);
    }

    fn rebuild_record_positions(&mut self) {
        self.record_positions = self
            .records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.id(), position))
            .collect();
    }
}

/// In-memory ledger and entity store.
///
/// One lock guards entities and audit records so snapshots, claims and
/// completions observe each other atomically.
#[derive(Default)]
pub struct InMemoryLedgerRepository {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerRepository {
    /// Creates an empty in-memory ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn load_snapshot(&self, service: &ServiceDefinition) -> AppResult<LedgerSnapshot> {
        let state = self.state.read().await;
        let taken_at = Utc::now();
        let entity_type = service.entity_type();

        let entities: Vec<EntityRecord> = state
            .entities
            .iter()
            .filter(|record| record.entity().entity_type == entity_type)
            .cloned()
            .collect();

        let pending: HashSet<EntityId> = state
            .pending
            .keys()
            .filter(|(entity, service_name)| {
                entity.entity_type == entity_type && service_name == service.service_name()
            })
            .map(|(entity, _)| entity.entity_id)
            .collect();

        let mut last_success: HashMap<EntityId, DateTime<Utc>> = HashMap::new();
        for record in state.records.iter().filter(|record| {
            record.status() == AuditStatus::Success
                && record.entity().entity_type == entity_type
                && record.service_name() == service.service_name()
        }) {
            let Some(completed_at) = record.completed_at() else {
                continue;
            };
            last_success
                .entry(record.entity().entity_id)
                .and_modify(|latest| *latest = (*latest).max(completed_at))
                .or_insert(completed_at);
        }

        Ok(LedgerSnapshot {
            taken_at,
            entities,
            pending,
            last_success,
        })
    }

    async fn claim_pending(&self, records: Vec<AuditRecord>) -> AppResult<Vec<AuditRecord>> {
        let mut state = self.state.write().await;
        let mut claimed = Vec::with_capacity(records.len());

        for record in records {
            if record.status() != AuditStatus::Pending {
                return Err(AppError::Validation(format!(
                    "audit record '{}' must be pending to claim",
                    record.id()
                )));
            }

            if !state.entity_positions.contains_key(&record.entity()) {
                return Err(AppError::NotFound(format!(
                    "entity '{}' does not exist",
                    record.entity()
                )));
            }

            let key = (record.entity(), record.service_name().clone());
            if state.pending.contains_key(&key) {
                continue;
            }

            state.push_record(record.clone());
            claimed.push(record);
        }

        Ok(claimed)
    }

    async fn release_pending(&self, record_ids: &[AuditRecordId]) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let release: HashSet<AuditRecordId> = record_ids
            .iter()
            .copied()
            .filter(|record_id| {
                state
                    .record_positions
                    .get(record_id)
                    .and_then(|position| state.records.get(*position))
                    .is_some_and(|record| record.status() == AuditStatus::Pending)
            })
            .collect();

        if release.is_empty() {
            return Ok(0);
        }

        state
            .pending
            .retain(|_, record_id| !release.contains(&*record_id));
        state
            .records
            .retain(|record| !release.contains(&record.id()));
        state.rebuild_record_positions();

        Ok(release.len() as u64)
    }

    async fn complete_pending(&self, input: CompletePendingInput) -> AppResult<AuditRecord> {
        let mut state = self.state.write().await;
        let key = (input.entity, input.service_name.clone());
        let Some(record_id) = state.pending.get(&key).copied() else {
            return Err(AppError::NotFound(format!(
                "no pending '{}' record for entity '{}'",
                input.service_name, input.entity
            )));
        };

        let position = state
            .record_positions
            .get(&record_id)
            .copied()
            .ok_or_else(|| {
                AppError::Internal(format!("pending audit record '{record_id}' is not indexed"))
            })?;
        let completed = state
            .records
            .get(position)
            .ok_or_else(|| {
                AppError::Internal(format!("audit record '{record_id}' index is out of range"))
            })?
            .complete(
                input.outcome,
                input.completed_at,
                input.error_message,
                &input.metadata,
            )?;

        if let Some(patch) = &input.attribute_updates
            && let Some(entity_position) = state.entity_positions.get(&input.entity).copied()
        {
            let entity = state.entities.get_mut(entity_position).ok_or_else(|| {
                AppError::Internal(format!("entity '{}' index is out of range", input.entity))
            })?;
            entity.merge_attributes(patch);
        }

        let stored = state.records.get_mut(position).ok_or_else(|| {
            AppError::Internal(format!("audit record '{record_id}' index is out of range"))
        })?;
        *stored = completed.clone();
        state.pending.remove(&key);

        Ok(completed)
    }

    async fn list_audit_records(&self, query: AuditRecordQuery) -> AppResult<Vec<AuditRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<&AuditRecord> = state
            .records
            .iter()
            .filter(|record| query.entity.is_none_or(|entity| record.entity() == entity))
            .filter(|record| {
                query
                    .service_name
                    .as_ref()
                    .is_none_or(|service_name| record.service_name() == service_name)
            })
            .filter(|record| query.status.is_none_or(|status| record.status() == status))
            .collect();

        records.sort_by(|left, right| {
            right
                .started_at()
                .cmp(&left.started_at())
                .then_with(|| right.id().as_uuid().cmp(&left.id().as_uuid()))
        });

        Ok(records
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn service_performance(
        &self,
        service_name: &ServiceName,
    ) -> AppResult<ServicePerformance> {
        let state = self.state.read().await;
        Ok(ServicePerformance::from_records(
            service_name.clone(),
            &state.records,
        ))
    }
}

#[async_trait]
impl EntityRepository for InMemoryLedgerRepository {
    async fn save_entity(&self, record: EntityRecord) -> AppResult<()> {
        let mut state = self.state.write().await;
        match state.entity_positions.get(&record.entity()).copied() {
            Some(position) => {
                let stored = state.entities.get_mut(position).ok_or_else(|| {
                    AppError::Internal(format!(
                        "entity '{}' index is out of range",
                        record.entity()
                    ))
                })?;
                *stored = record;
            }
            None => {
                let position = state.entities.len();
                state.entity_positions.insert(record.entity(), position);
                state.entities.push(record);
            }
        }

        Ok(())
    }

    async fn find_entity(&self, entity: EntityRef) -> AppResult<Option<EntityRecord>> {
        let state = self.state.read().await;
        Ok(state
            .entity_positions
            .get(&entity)
            .and_then(|position| state.entities.get(*position))
            .cloned())
    }
}
