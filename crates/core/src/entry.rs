//! Tracked document submissions and their status lifecycle.
//!
//! Each [`JobEntry`] moves through `Idle -> Processing -> {Success, Error}`.
//! The two right-hand states are terminal: once reached, neither the
//! status nor the captured result changes again.

use serde::Serialize;

use crate::error::CoreError;
use crate::receipt::ExtractionResult;
use crate::types::EntryId;

/// Lifecycle status of a tracked entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Not yet submitted; eligible for the next batch run.
    Idle,
    /// Submitted; a remote task is in flight.
    Processing,
    /// Terminal: extraction succeeded and the result is captured.
    Success,
    /// Terminal: extraction failed or timed out locally.
    Error,
}

impl EntryStatus {
    /// `Success` and `Error` are terminal; no further transitions occur.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

/// One user-submitted document under tracking.
#[derive(Debug, Clone)]
pub struct JobEntry {
    /// Client-generated id, stable for the entry's lifetime.
    pub id: EntryId,
    /// Original filename. The only correlation key the bulk submission
    /// endpoint echoes back.
    pub filename: String,
    /// Raw document bytes. Opaque to everything in this workspace; only
    /// the remote service inspects them.
    pub payload: Vec<u8>,
    pub status: EntryStatus,
    /// Opaque identifier assigned by the remote service on submission.
    pub task_id: Option<String>,
    /// Present iff `status == Success`.
    pub result: Option<ExtractionResult>,
    /// Failure reason, present iff `status == Error`.
    pub error: Option<String>,
}

impl JobEntry {
    /// Create a fresh `Idle` entry with a new client-generated id.
    pub fn new(filename: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            filename: filename.into(),
            payload,
            status: EntryStatus::Idle,
            task_id: None,
            result: None,
            error: None,
        }
    }

    /// Record the remote task identifier and move to `Processing`.
    ///
    /// Rejected unless the entry is `Idle`: an entry is submitted at
    /// most once per batch run, and a terminal entry is never
    /// re-submitted without an explicit [`reset_for_retry`](Self::reset_for_retry).
    pub fn mark_submitted(&mut self, task_id: impl Into<String>) -> Result<(), CoreError> {
        if self.status != EntryStatus::Idle {
            return Err(CoreError::Conflict(format!(
                "entry {} is {:?}, only Idle entries can be submitted",
                self.id, self.status
            )));
        }
        self.status = EntryStatus::Processing;
        self.task_id = Some(task_id.into());
        Ok(())
    }

    /// Apply a terminal `Success` observation, capturing the result.
    ///
    /// Returns `false` without mutating anything when the entry is
    /// already terminal, so stale observations cannot overwrite an
    /// earlier outcome.
    pub fn complete_success(&mut self, result: ExtractionResult) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = EntryStatus::Success;
        self.result = Some(result);
        self.error = None;
        true
    }

    /// Apply a terminal `Error` observation, capturing the reason.
    ///
    /// Returns `false` without mutating anything when the entry is
    /// already terminal.
    pub fn complete_error(&mut self, reason: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = EntryStatus::Error;
        self.error = Some(reason.into());
        self.result = None;
        true
    }

    /// Reset a failed entry back to `Idle` for an explicit user retry.
    ///
    /// Nothing in this workspace calls this automatically; failed
    /// entries stay failed until the user asks for another attempt.
    pub fn reset_for_retry(&mut self) -> Result<(), CoreError> {
        if self.status != EntryStatus::Error {
            return Err(CoreError::Conflict(format!(
                "entry {} is {:?}, only Error entries can be retried",
                self.id, self.status
            )));
        }
        self.status = EntryStatus::Idle;
        self.task_id = None;
        self.result = None;
        self.error = None;
        Ok(())
    }
}
