//! Trait seam between the orchestrator and the HTTP layer.
//!
//! The batch and single-document flows only ever need three calls:
//! submit one, submit many, and poll one task. Narrowing the surface to
//! this trait lets tests drive the orchestrator with a scripted
//! in-memory service instead of a live HTTP endpoint.

use async_trait::async_trait;

use crate::api::{ExtractionApi, ExtractionApiError};
use crate::responses::{BulkSubmitResponse, SubmitResponse, TaskStatusResponse};

/// The subset of the extraction service the job orchestration consumes.
#[async_trait]
pub trait ReceiptService: Send + Sync {
    /// Submit one document; returns the server-assigned task identifier.
    async fn submit_receipt(
        &self,
        filename: &str,
        payload: Vec<u8>,
        generate_summary: bool,
    ) -> Result<SubmitResponse, ExtractionApiError>;

    /// Submit several documents in one request; the response carries one
    /// item per file, keyed by filename.
    async fn submit_receipts_bulk(
        &self,
        files: Vec<(String, Vec<u8>)>,
        generate_summary: bool,
    ) -> Result<BulkSubmitResponse, ExtractionApiError>;

    /// Fetch the current state of one asynchronous task.
    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResponse, ExtractionApiError>;
}

#[async_trait]
impl ReceiptService for ExtractionApi {
    async fn submit_receipt(
        &self,
        filename: &str,
        payload: Vec<u8>,
        generate_summary: bool,
    ) -> Result<SubmitResponse, ExtractionApiError> {
        ExtractionApi::submit_receipt(self, filename, payload, generate_summary).await
    }

    async fn submit_receipts_bulk(
        &self,
        files: Vec<(String, Vec<u8>)>,
        generate_summary: bool,
    ) -> Result<BulkSubmitResponse, ExtractionApiError> {
        ExtractionApi::submit_receipts_bulk(self, files, generate_summary).await
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatusResponse, ExtractionApiError> {
        ExtractionApi::task_status(self, task_id).await
    }
}
