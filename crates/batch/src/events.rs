//! Batch lifecycle events broadcast to interested subscribers.
//!
//! The presentation layer subscribes via
//! [`BatchOrchestrator::subscribe`](crate::orchestrator::BatchOrchestrator::subscribe)
//! instead of holding a reference into the job set.

use reciva_core::progress::BatchProgress;
use reciva_core::types::EntryId;

/// Events emitted as entries move through their lifecycle.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    /// The remote service accepted the entry and assigned a task.
    EntrySubmitted { id: EntryId, task_id: String },
    /// The entry reached `Success`; its result is captured on the entry.
    EntryCompleted { id: EntryId },
    /// The entry reached `Error`.
    EntryFailed { id: EntryId, error: String },
    /// Aggregated progress, recomputed after a poll cycle.
    ProgressUpdated(BatchProgress),
    /// No entry remains in flight; the run is over.
    BatchSettled(BatchProgress),
}
