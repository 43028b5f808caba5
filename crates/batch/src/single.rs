//! Single-document flow: upload one file, poll its task to completion.
//!
//! Unlike batch monitoring, which runs until natural settlement, the
//! single flow gives up locally after a bounded number of attempts.
//! The remote task may still finish afterwards; its identifier is
//! simply discarded.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use reciva_client::responses::TaskState;
use reciva_client::{ExtractionApiError, ReceiptService};
use reciva_core::receipt::ExtractionResult;

/// Tunables for the single-document flow.
#[derive(Debug, Clone)]
pub struct SingleConfig {
    /// Delay between polling attempts.
    pub interval: Duration,
    /// Attempt ceiling after which the job fails locally with a
    /// timeout, regardless of remote state.
    pub max_attempts: u32,
}

impl Default for SingleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 60,
        }
    }
}

/// Errors from the single-document flow.
#[derive(Debug, thiserror::Error)]
pub enum SingleJobError {
    /// The upload call failed; no task was created as far as the client
    /// knows.
    #[error("submission failed: {0}")]
    Submit(#[source] ExtractionApiError),

    /// The remote task reported `FAILURE`.
    #[error("extraction failed: {0}")]
    Failed(String),

    /// The attempt ceiling was reached before the task settled.
    #[error("timed out after {attempts} polling attempts")]
    Timeout { attempts: u32 },
}

/// Drives one document through upload and polling.
pub struct SingleProcessor {
    service: Arc<dyn ReceiptService>,
    config: SingleConfig,
    status_tx: watch::Sender<String>,
}

impl SingleProcessor {
    pub fn new(service: Arc<dyn ReceiptService>, config: SingleConfig) -> Self {
        let (status_tx, _) = watch::channel(String::new());
        Self {
            service,
            config,
            status_tx,
        }
    }

    /// Watch the human-readable status line ("Uploading...", then
    /// whatever the task endpoint reports while the job runs).
    pub fn subscribe_status(&self) -> watch::Receiver<String> {
        self.status_tx.subscribe()
    }

    /// Upload a document and poll its task until it settles or the
    /// attempt ceiling is reached.
    pub async fn process(
        &self,
        filename: &str,
        payload: Vec<u8>,
        generate_summary: bool,
    ) -> Result<ExtractionResult, SingleJobError> {
        self.set_status("Uploading...");

        let submitted = self
            .service
            .submit_receipt(filename, payload, generate_summary)
            .await
            .map_err(SingleJobError::Submit)?;

        tracing::info!(filename, task_id = %submitted.task_id, "Receipt submitted");
        self.set_status("Queued...");

        self.poll_task(&submitted.task_id).await
    }

    /// Poll one task with a fixed cadence and a hard attempt ceiling.
    ///
    /// Transport errors count as an attempt but carry no new
    /// information; the next attempt retries. Only a remote `FAILURE`
    /// or the ceiling itself fails the job.
    async fn poll_task(&self, task_id: &str) -> Result<ExtractionResult, SingleJobError> {
        for attempt in 1..=self.config.max_attempts {
            match self.service.task_status(task_id).await {
                Ok(response) => match response.state {
                    TaskState::Success => {
                        return Ok(response.result.map(|r| r.data).unwrap_or_default());
                    }
                    TaskState::Failure => {
                        return Err(SingleJobError::Failed(
                            response
                                .error
                                .unwrap_or_else(|| "extraction failed".to_string()),
                        ));
                    }
                    TaskState::Pending | TaskState::Running | TaskState::Unknown => {
                        self.set_status(
                            response
                                .status
                                .unwrap_or_else(|| "Processing...".to_string()),
                        );
                    }
                },
                Err(e) => {
                    tracing::debug!(
                        task_id,
                        attempt,
                        error = %e,
                        "Status query failed; retrying next attempt",
                    );
                }
            }

            tokio::time::sleep(self.config.interval).await;
        }

        tracing::warn!(
            task_id,
            attempts = self.config.max_attempts,
            "Polling ceiling reached; giving up on task",
        );
        Err(SingleJobError::Timeout {
            attempts: self.config.max_attempts,
        })
    }

    fn set_status(&self, text: impl Into<String>) {
        // send_replace never fails, even with no subscribers.
        self.status_tx.send_replace(text.into());
    }
}
