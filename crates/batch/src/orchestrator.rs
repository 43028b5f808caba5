//! Batch lifecycle orchestration: submit -> monitor -> settle.
//!
//! [`BatchOrchestrator`] is the single writer of the tracked job set.
//! Submission converts idle entries to in-flight ones under one write
//! lock, the spawned monitor task applies each poll cycle's outcomes as
//! one batched update, and readers only ever observe consistent
//! snapshots between those updates.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use reciva_client::{ExtractionApiError, ReceiptService};
use reciva_core::entry::{EntryStatus, JobEntry};
use reciva_core::error::CoreError;
use reciva_core::progress::{BatchProgress, BatchRun};
use reciva_core::types::EntryId;

use crate::events::BatchEvent;
use crate::poller::{poll_cycle, PollConfig, PollOutcome};

/// Broadcast channel capacity for batch events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Maximum files the bulk endpoint accepts per request.
pub const MAX_BULK_FILES: usize = 20;

/// Reason recorded on entries that outlive the polling ceiling.
const TIMEOUT_REASON: &str = "timed out waiting for the extraction service";

/// Lifecycle state of the batch as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// No run in progress.
    Idle,
    /// A run was submitted and its monitor loop is polling.
    Running,
    /// The last run finished; entries hold their terminal outcomes.
    Settled,
}

/// Errors returned by orchestrator operations.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("no idle entries to submit")]
    NothingToSubmit,

    #[error("a batch run is already in progress")]
    AlreadyRunning,

    #[error("cannot clear entries while a batch run is in progress")]
    ClearWhileRunning,

    #[error("entry {0} not found")]
    EntryNotFound(EntryId),

    #[error("entry {0} has an in-flight remote task and cannot be removed")]
    RemoveWhileProcessing(EntryId),

    #[error("too many files for one batch: {count} exceeds the limit of {limit}")]
    BatchTooLarge { count: usize, limit: usize },

    /// The bulk submission call failed; no entry left `Idle`.
    #[error("submission failed: {0}")]
    Submit(#[from] ExtractionApiError),

    #[error(transparent)]
    Entry(#[from] CoreError),
}

struct Inner {
    entries: Vec<JobEntry>,
    state: BatchState,
    run: Option<BatchRun>,
}

/// Owns the job set and drives batch runs against the remote service.
pub struct BatchOrchestrator {
    service: Arc<dyn ReceiptService>,
    config: PollConfig,
    inner: RwLock<Inner>,
    event_tx: broadcast::Sender<BatchEvent>,
    /// Cancelled on shutdown; stops the monitor task between cycles.
    cancel: CancellationToken,
}

impl BatchOrchestrator {
    /// Create an orchestrator with an empty job set.
    ///
    /// The returned `Arc` can be cheaply cloned into whatever drives it.
    pub fn new(service: Arc<dyn ReceiptService>, config: PollConfig) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Arc::new(Self {
            service,
            config,
            inner: RwLock::new(Inner {
                entries: Vec::new(),
                state: BatchState::Idle,
                run: None,
            }),
            event_tx,
            cancel: CancellationToken::new(),
        })
    }

    /// Subscribe to batch lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.event_tx.subscribe()
    }

    /// Add a document to the job set as a fresh `Idle` entry.
    ///
    /// Entries added while a run is in flight belong to the next run.
    pub async fn add_file(&self, filename: impl Into<String>, payload: Vec<u8>) -> EntryId {
        let entry = JobEntry::new(filename, payload);
        let id = entry.id;
        self.inner.write().await.entries.push(entry);
        id
    }

    /// Snapshot of the tracked entries.
    pub async fn entries(&self) -> Vec<JobEntry> {
        self.inner.read().await.entries.clone()
    }

    /// Current batch lifecycle state.
    pub async fn state(&self) -> BatchState {
        self.inner.read().await.state
    }

    /// Aggregated progress of the current (or last settled) run.
    pub async fn progress(&self) -> Option<BatchProgress> {
        let inner = self.inner.read().await;
        inner
            .run
            .as_ref()
            .map(|run| run.aggregate(&inner.entries, Utc::now()))
    }

    /// Remove an entry from the job set.
    ///
    /// Rejected while the entry is `Processing`: dropping an in-flight
    /// remote task from tracking would orphan the remote work and let
    /// local and remote state diverge.
    pub async fn remove(&self, id: EntryId) -> Result<(), OrchestratorError> {
        let mut inner = self.inner.write().await;
        let Some(pos) = inner.entries.iter().position(|e| e.id == id) else {
            return Err(OrchestratorError::EntryNotFound(id));
        };
        if inner.entries[pos].status == EntryStatus::Processing {
            return Err(OrchestratorError::RemoveWhileProcessing(id));
        }
        inner.entries.remove(pos);
        Ok(())
    }

    /// Discard all entries and reset run statistics.
    ///
    /// Rejected while a run is in progress.
    pub async fn clear(&self) -> Result<(), OrchestratorError> {
        let mut inner = self.inner.write().await;
        if inner.state == BatchState::Running {
            return Err(OrchestratorError::ClearWhileRunning);
        }
        inner.entries.clear();
        inner.run = None;
        inner.state = BatchState::Idle;
        Ok(())
    }

    /// Reset a failed entry to `Idle` so the next run retries it.
    ///
    /// Retry is always an explicit caller action; nothing resets
    /// entries automatically.
    pub async fn reset_entry(&self, id: EntryId) -> Result<(), OrchestratorError> {
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.entries.iter_mut().find(|e| e.id == id) else {
            return Err(OrchestratorError::EntryNotFound(id));
        };
        entry.reset_for_retry()?;
        Ok(())
    }

    /// Submit every idle entry as one bulk request and start monitoring.
    ///
    /// Returns the number of entries included in the run. On a failed
    /// submission call nothing transitions: the job set is exactly as
    /// it was and the error is surfaced to the caller.
    pub async fn submit(self: &Arc<Self>, generate_summary: bool) -> Result<usize, OrchestratorError> {
        // The write lock is held across the remote call so a concurrent
        // submit cannot pick up the same idle entries.
        let mut inner = self.inner.write().await;
        if inner.state == BatchState::Running {
            return Err(OrchestratorError::AlreadyRunning);
        }

        let files: Vec<(String, Vec<u8>)> = inner
            .entries
            .iter()
            .filter(|e| e.status == EntryStatus::Idle)
            .map(|e| (e.filename.clone(), e.payload.clone()))
            .collect();

        if files.is_empty() {
            return Err(OrchestratorError::NothingToSubmit);
        }
        if files.len() > MAX_BULK_FILES {
            return Err(OrchestratorError::BatchTooLarge {
                count: files.len(),
                limit: MAX_BULK_FILES,
            });
        }

        let started_at = Utc::now();
        let response = self
            .service
            .submit_receipts_bulk(files, generate_summary)
            .await?;

        // Correlation is by filename only; the bulk contract echoes
        // nothing stronger. Each response item consumes the first
        // still-idle entry with its filename, so duplicate names cannot
        // double-assign one entry. Items the service rejected up front
        // carry no task id and fail immediately.
        let mut run_ids = Vec::new();
        for task in &response.tasks {
            let Some(entry) = inner
                .entries
                .iter_mut()
                .find(|e| e.status == EntryStatus::Idle && e.filename == task.filename)
            else {
                tracing::warn!(
                    filename = %task.filename,
                    "Bulk response item matches no idle entry; ignoring",
                );
                continue;
            };

            if let Some(task_id) = &task.task_id {
                if entry.mark_submitted(task_id.clone()).is_ok() {
                    run_ids.push(entry.id);
                    let _ = self.event_tx.send(BatchEvent::EntrySubmitted {
                        id: entry.id,
                        task_id: task_id.clone(),
                    });
                }
            } else {
                let reason = task
                    .error
                    .clone()
                    .unwrap_or_else(|| "rejected by the extraction service".to_string());
                let id = entry.id;
                if entry.complete_error(reason.clone()) {
                    run_ids.push(id);
                    let _ = self.event_tx.send(BatchEvent::EntryFailed { id, error: reason });
                }
            }
        }

        if run_ids.is_empty() {
            tracing::warn!("Bulk response contained no usable items; no run started");
            return Ok(0);
        }

        let submitted = run_ids.len();
        inner.run = Some(BatchRun::begin(run_ids, started_at));
        inner.state = BatchState::Running;
        drop(inner);

        tracing::info!(submitted, "Batch run started");

        let orchestrator = Arc::clone(self);
        tokio::spawn(async move { orchestrator.run_monitor().await });

        Ok(submitted)
    }

    /// Stop the monitor task. In-flight remote tasks are left running;
    /// the service has no cancellation endpoint.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    // ---- monitor loop ----

    /// Poll until every run entry is terminal, the cycle ceiling is
    /// reached, or shutdown is requested.
    async fn run_monitor(self: Arc<Self>) {
        let mut cycles: u32 = 0;

        loop {
            let in_flight = self.in_flight().await;
            if in_flight.is_empty() {
                self.settle().await;
                return;
            }

            cycles += 1;
            let outcomes = poll_cycle(self.service.as_ref(), &in_flight).await;
            if self.apply_outcomes(outcomes).await {
                self.settle().await;
                return;
            }

            if let Some(max) = self.config.max_cycles {
                if cycles >= max {
                    tracing::warn!(
                        cycles,
                        "Batch polling ceiling reached; failing remaining entries locally",
                    );
                    self.expire().await;
                    return;
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("Batch monitor stopped by shutdown");
                    return;
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }

    /// The current run's entries that still have a task in flight,
    /// re-read from the latest job set each cycle.
    async fn in_flight(&self) -> Vec<(EntryId, String)> {
        let inner = self.inner.read().await;
        let Some(run) = &inner.run else {
            return Vec::new();
        };
        inner
            .entries
            .iter()
            .filter(|e| run.contains(e.id) && e.status == EntryStatus::Processing)
            .filter_map(|e| e.task_id.as_ref().map(|t| (e.id, t.clone())))
            .collect()
    }

    /// Apply one cycle's outcomes as a single batched update against
    /// the latest entry set. Returns `true` once the run has no entry
    /// left in flight.
    ///
    /// Outcomes for entries that no longer exist are discarded, and
    /// already-terminal entries are never overwritten, so a stale
    /// observation cannot change settled state.
    async fn apply_outcomes(&self, outcomes: Vec<PollOutcome>) -> bool {
        let mut inner = self.inner.write().await;

        for outcome in outcomes {
            match outcome {
                PollOutcome::Completed { id, result } => {
                    let Some(entry) = inner.entries.iter_mut().find(|e| e.id == id) else {
                        continue;
                    };
                    if entry.complete_success(result) {
                        tracing::info!(entry_id = %id, filename = %entry.filename, "Extraction completed");
                        let _ = self.event_tx.send(BatchEvent::EntryCompleted { id });
                    }
                }
                PollOutcome::Failed { id, error } => {
                    let Some(entry) = inner.entries.iter_mut().find(|e| e.id == id) else {
                        continue;
                    };
                    if entry.complete_error(error.clone()) {
                        tracing::warn!(
                            entry_id = %id,
                            filename = %entry.filename,
                            error = %error,
                            "Extraction failed",
                        );
                        let _ = self.event_tx.send(BatchEvent::EntryFailed { id, error });
                    }
                }
            }
        }

        let Some(run) = &inner.run else {
            return true;
        };
        let progress = run.aggregate(&inner.entries, Utc::now());
        let _ = self.event_tx.send(BatchEvent::ProgressUpdated(progress));
        progress.completed_count >= progress.total_count
    }

    /// Mark the run settled and emit the final progress (ETA cleared).
    async fn settle(&self) {
        let mut inner = self.inner.write().await;
        if inner.state != BatchState::Running {
            return;
        }
        inner.state = BatchState::Settled;

        if let Some(run) = &inner.run {
            let progress = run.aggregate(&inner.entries, Utc::now());
            tracing::info!(
                completed = progress.completed_count,
                total = progress.total_count,
                "Batch run settled",
            );
            let _ = self.event_tx.send(BatchEvent::BatchSettled(progress));
        }
    }

    /// Fail every run entry still in flight with a timeout reason, then
    /// settle. The remote tasks may keep running; only local tracking
    /// gives up.
    async fn expire(&self) {
        {
            let mut inner = self.inner.write().await;
            let Inner { entries, run, .. } = &mut *inner;
            let Some(run) = run else { return };

            for entry in entries.iter_mut().filter(|e| run.contains(e.id)) {
                let id = entry.id;
                if entry.complete_error(TIMEOUT_REASON) {
                    let _ = self.event_tx.send(BatchEvent::EntryFailed {
                        id,
                        error: TIMEOUT_REASON.to_string(),
                    });
                }
            }
        }
        self.settle().await;
    }
}
