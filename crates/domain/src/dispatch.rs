use enrichly_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{EntityId, ServiceName};

/// Hard cap on entities claimed by one dispatch call.
pub const MAX_DISPATCH_BATCH_SIZE: usize = 1000;

/// Validates a requested batch size and clamps it to [`MAX_DISPATCH_BATCH_SIZE`].
pub fn effective_batch_size(requested_count: i64) -> AppResult<usize> {
    if requested_count <= 0 {
        return Err(AppError::Validation(
            "requested count must be greater than zero".to_owned(),
        ));
    }

    Ok(usize::try_from(requested_count)
        .unwrap_or(MAX_DISPATCH_BATCH_SIZE)
        .min(MAX_DISPATCH_BATCH_SIZE))
}

/// Result of one dispatch call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchBatch {
    /// Service the batch was dispatched for.
    pub service_name: ServiceName,
    /// Count requested by the caller before clamping.
    pub requested_count: i64,
    /// Count after clamping to the hard cap.
    pub effective_count: usize,
    /// Candidate pool size when the batch was selected.
    pub available_count: usize,
    /// Claimed entities in candidate order.
    pub entity_ids: Vec<EntityId>,
}

impl DispatchBatch {
    /// Returns how many entities were actually dispatched.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.entity_ids.len()
    }

    /// Returns whether nothing was dispatched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entity_ids.is_empty()
    }
}

/// Queue and completion counters derived from one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceCounters {
    /// Entities currently eligible for dispatch.
    pub needing: u64,
    /// Pending audit records.
    pub pending: u64,
    /// Distinct entities whose latest success is still within the refresh interval.
    pub completed: u64,
}

impl ServiceCounters {
    /// Returns completed entities as a share of needing plus completed.
    #[must_use]
    pub fn completion_percentage(&self) -> f64 {
        let total = self.needing.saturating_add(self.completed);
        if total == 0 {
            return 0.0;
        }

        let percentage = self.completed as f64 * 100.0 / total as f64;
        (percentage * 10.0).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_DISPATCH_BATCH_SIZE, ServiceCounters, effective_batch_size};

    #[test]
    fn batch_size_rejects_non_positive_values() {
        assert!(effective_batch_size(0).is_err());
        assert!(effective_batch_size(-5).is_err());
    }

    #[test]
    fn batch_size_clamps_to_cap() {
        assert_eq!(effective_batch_size(5000).ok(), Some(MAX_DISPATCH_BATCH_SIZE));
        assert_eq!(effective_batch_size(1000).ok(), Some(1000));
        assert_eq!(effective_batch_size(7).ok(), Some(7));
    }

    #[test]
    fn completion_percentage_handles_empty_and_partial_progress() {
        let empty = ServiceCounters {
            needing: 0,
            pending: 0,
            completed: 0,
        };
        assert_eq!(empty.completion_percentage(), 0.0);

        let partial = ServiceCounters {
            needing: 2,
            pending: 1,
            completed: 1,
        };
        assert_eq!(partial.completion_percentage(), 33.3);
    }
}
