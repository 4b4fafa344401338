mod audit;
mod common;
mod entities;
mod queue;
mod services;
mod worker;

pub use audit::{AuditRecordResponse, AuditRecordsQuery};
pub use common::{HealthDependencyStatus, HealthResponse};
pub use entities::{EntityResponse, PutEntityRequest};
pub use queue::{
    CandidatesQuery, CandidatesResponse, DispatchQueueRequest, DispatchQueueResponse,
    QueueStatusResponse, ScopeQuery,
};
pub use services::{ServicePerformanceResponse, ServiceResponse, UpdateServiceSettingsRequest};
pub use worker::CompleteJobRequest;
