//! Application services and ports.

#![forbid(unsafe_code)]

mod entity_directory_service;
mod ledger_ports;
mod ledger_service;

pub use entity_directory_service::EntityDirectoryService;
pub use ledger_ports::{
    AuditRecordQuery, CompleteDispatchInput, CompletePendingInput, EntityRepository, JobHandle,
    JobSource, JobSubmission, JobSubmitter, LedgerCountersCache, LedgerCountersKey,
    LedgerRepository, LedgerSnapshot, QueuedJob, ServiceCatalogRepository,
    UpdateServiceSettingsInput,
};
pub use ledger_service::{
    Candidates, DEFAULT_AUDIT_TRAIL_LIMIT, MAX_AUDIT_TRAIL_LIMIT, ServiceDispatchLedger,
};
