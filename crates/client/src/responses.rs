//! Typed responses for the extraction service wire format.

use reciva_core::receipt::ExtractionResult;
use serde::Deserialize;

/// Remote lifecycle states reported by `GET /api/v1/tasks/{task_id}`.
///
/// The task queue can surface states beyond the four the client acts
/// on (e.g. a retry state); those map to [`Unknown`](Self::Unknown) and
/// are treated the same as still-running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    Pending,
    Running,
    Success,
    Failure,
    #[serde(other)]
    Unknown,
}

/// Response from the task status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatusResponse {
    pub state: TaskState,
    /// Human-readable progress line, present while the task is queued
    /// or running ("Task is waiting in queue...").
    pub status: Option<String>,
    /// Present on `SUCCESS`.
    pub result: Option<TaskResult>,
    /// Present on `FAILURE`.
    pub error: Option<String>,
}

/// Envelope around the extraction payload in a successful task response.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskResult {
    pub data: ExtractionResult,
}

/// Response from `POST /api/v1/process-receipt`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub task_id: String,
}

/// One item of the bulk submission response.
///
/// Files the service rejects up front (e.g. an unsupported content
/// type) come back with an `error` and no `task_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkTask {
    pub filename: String,
    pub task_id: Option<String>,
    pub error: Option<String>,
}

/// Response from `POST /api/v1/process-receipt/bulk`.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkSubmitResponse {
    pub batch_id: Option<String>,
    pub tasks: Vec<BulkTask>,
}

/// One prior extraction record from `GET /api/v1/receipts/history`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub task_id: String,
    pub filename: String,
    pub status: String,
    pub merchant: Option<String>,
    pub date: Option<String>,
    pub total: Option<f64>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub tip: Option<f64>,
    pub discount: Option<f64>,
    pub other_fees: Option<f64>,
    pub summary: Option<String>,
    pub raw_text: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// The service stores naive UTC timestamps.
    pub created_at: Option<chrono::NaiveDateTime>,
}
