use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use enrichly_domain::{EntityId, EntityRecord};

/// Point-in-time view of one service's entities and audit state.
///
/// Every field must come from the same read so candidates and counters agree.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSnapshot {
    /// Snapshot timestamp used for refresh-interval checks.
    pub taken_at: DateTime<Utc>,
    /// Entities of the service's type in stable dispatch order.
    pub entities: Vec<EntityRecord>,
    /// Entities with a pending record for the service.
    pub pending: HashSet<EntityId>,
    /// Latest success completion per entity for the service.
    pub last_success: HashMap<EntityId, DateTime<Utc>>,
}
