use enrichly_application::{EntityDirectoryService, ServiceDispatchLedger};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: ServiceDispatchLedger,
    pub entity_directory: EntityDirectoryService,
    pub worker_shared_secret: Option<String>,
    pub postgres_pool: Option<PgPool>,
    pub redis_client: Option<redis::Client>,
    pub redis_required: bool,
}
