//! Per-cycle task polling: concurrent status fan-out and outcome mapping.

use std::time::Duration;

use futures::future::join_all;
use reciva_client::responses::{TaskState, TaskStatusResponse};
use reciva_client::{ExtractionApiError, ReceiptService};
use reciva_core::receipt::ExtractionResult;
use reciva_core::types::EntryId;

/// Tunable knobs for the batch polling loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between the end of one poll cycle and the start of the
    /// next. Fixed cadence, no backoff.
    pub interval: Duration,
    /// Optional ceiling on poll cycles per run. When reached, entries
    /// still in flight fail locally with a timeout reason. `None` polls
    /// until natural settlement.
    pub max_cycles: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            max_cycles: None,
        }
    }
}

/// Terminal observation for one entry out of a poll cycle.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Completed { id: EntryId, result: ExtractionResult },
    Failed { id: EntryId, error: String },
}

/// Map a task status response onto an outcome for one entry.
///
/// `None` means no new information this cycle: the task is still
/// pending or running (or reported a state the client does not act on)
/// and the entry stays `Processing`.
pub fn map_status(id: EntryId, response: TaskStatusResponse) -> Option<PollOutcome> {
    match response.state {
        TaskState::Success => {
            let result = response.result.map(|r| r.data).unwrap_or_default();
            Some(PollOutcome::Completed { id, result })
        }
        TaskState::Failure => Some(PollOutcome::Failed {
            id,
            error: response
                .error
                .unwrap_or_else(|| "extraction failed".to_string()),
        }),
        TaskState::Pending | TaskState::Running | TaskState::Unknown => None,
    }
}

/// Issue one status query per in-flight task, concurrently, and collect
/// the terminal outcomes.
///
/// A query that fails at the transport level yields no outcome for its
/// entry; the next cycle retries it. Failures here never transition an
/// entry.
pub async fn poll_cycle(
    service: &dyn ReceiptService,
    in_flight: &[(EntryId, String)],
) -> Vec<PollOutcome> {
    let queries = in_flight.iter().map(|(id, task_id)| async move {
        match service.task_status(task_id).await {
            Ok(response) => map_status(*id, response),
            Err(e) => {
                log_transient(*id, task_id, &e);
                None
            }
        }
    });

    join_all(queries).await.into_iter().flatten().collect()
}

fn log_transient(id: EntryId, task_id: &str, error: &ExtractionApiError) {
    tracing::debug!(
        entry_id = %id,
        task_id = %task_id,
        error = %error,
        "Status query failed; retrying next cycle",
    );
}
