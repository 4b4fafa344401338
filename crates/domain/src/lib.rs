//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod dispatch;
mod eligibility;
mod entity;
mod performance;
mod service;

pub use audit::{AuditRecord, AuditRecordId, AuditRecordParts, AuditStatus, CompletionOutcome};
pub use dispatch::{
    DispatchBatch, MAX_DISPATCH_BATCH_SIZE, ServiceCounters, effective_batch_size,
};
pub use eligibility::{COUNTRY_ATTRIBUTE, DispatchScope, EligibilityRule};
pub use entity::{EntityId, EntityRecord, EntityRef, EntityType};
pub use performance::ServicePerformance;
pub use service::{
    ServiceDefinition, ServiceDefinitionInput, ServiceName, builtin_service_definitions,
};
