//! Batch run bookkeeping and progress/ETA aggregation.
//!
//! The ETA is a linear projection from the observed per-item average:
//! `ceil(elapsed / completed * remaining)`. It assumes roughly uniform
//! per-item cost and is a display hint, not a forecast.

use crate::entry::{EntryStatus, JobEntry};
use crate::types::{EntryId, Timestamp};

/// Aggregated view over the entries submitted in the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BatchProgress {
    /// Entries from this run that reached a terminal state.
    pub completed_count: usize,
    /// Entries submitted in this run.
    pub total_count: usize,
    /// Estimated seconds remaining. `None` before the first completion
    /// and after the last one. Never zero, which would read as "still
    /// running with no time left".
    pub eta_seconds: Option<u64>,
}

/// One submit-to-settle cycle over a set of entries.
///
/// Membership is fixed at submission time: entries added to the job set
/// afterwards belong to a future run, and entries already terminal from
/// a prior run are excluded.
#[derive(Debug, Clone)]
pub struct BatchRun {
    /// Captured when submission started.
    pub started_at: Timestamp,
    /// Ids of the entries submitted in this run.
    pub entry_ids: Vec<EntryId>,
}

impl BatchRun {
    pub fn begin(entry_ids: Vec<EntryId>, started_at: Timestamp) -> Self {
        Self {
            started_at,
            entry_ids,
        }
    }

    pub fn total_submitted(&self) -> usize {
        self.entry_ids.len()
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.entry_ids.contains(&id)
    }

    /// Aggregate progress over this run's entries at time `now`.
    ///
    /// Completion is counted as `total - still_in_flight` rather than by
    /// scanning for terminal members, so removing an already-terminal
    /// entry from the job set mid-run cannot make the count go
    /// backwards.
    pub fn aggregate(&self, entries: &[JobEntry], now: Timestamp) -> BatchProgress {
        let in_flight = entries
            .iter()
            .filter(|e| self.contains(e.id) && e.status == EntryStatus::Processing)
            .count();

        let total_count = self.total_submitted();
        let completed_count = total_count - in_flight;
        let elapsed_secs = (now - self.started_at).num_milliseconds().max(0) as f64 / 1000.0;

        BatchProgress {
            completed_count,
            total_count,
            eta_seconds: eta_seconds(elapsed_secs, completed_count, total_count),
        }
    }
}

/// Estimated seconds remaining, linearly projected from the per-item
/// average observed so far.
///
/// Defined only while the run is partially complete: `None` when
/// nothing has finished yet (no average exists) and when everything has
/// (nothing remains).
pub fn eta_seconds(elapsed_secs: f64, completed_count: usize, total_count: usize) -> Option<u64> {
    if completed_count == 0 || completed_count >= total_count {
        return None;
    }
    let average = elapsed_secs / completed_count as f64;
    let remaining = (total_count - completed_count) as f64;
    Some((average * remaining).ceil() as u64)
}
