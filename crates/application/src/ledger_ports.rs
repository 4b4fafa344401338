mod cache;
mod inputs;
mod repository;
mod snapshot;
mod submission;

pub use cache::{LedgerCountersCache, LedgerCountersKey};
pub use inputs::{
    AuditRecordQuery, CompleteDispatchInput, CompletePendingInput, UpdateServiceSettingsInput,
};
pub use repository::{EntityRepository, LedgerRepository, ServiceCatalogRepository};
pub use snapshot::LedgerSnapshot;
pub use submission::{JobHandle, JobSource, JobSubmission, JobSubmitter, QueuedJob};
