//! REST client for the receipt extraction service HTTP endpoints.
//!
//! Wraps submission (single and bulk), task status polling, history
//! retrieval, and the liveness probe using [`reqwest`].

use reqwest::multipart::{Form, Part};

use crate::responses::{BulkSubmitResponse, HistoryRecord, SubmitResponse, TaskStatusResponse};

/// HTTP client for one extraction service deployment.
pub struct ExtractionApi {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the extraction service REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("extraction service error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl ExtractionApi {
    /// Create a new API client.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling across clients).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// Base HTTP URL of the service.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Liveness probe against `GET /`. Any success status means healthy.
    pub async fn check_health(&self) -> Result<(), ExtractionApiError> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Submit one document for extraction.
    ///
    /// Sends `POST /api/v1/process-receipt` as a multipart form and
    /// returns the server-assigned task identifier.
    pub async fn submit_receipt(
        &self,
        filename: &str,
        payload: Vec<u8>,
        generate_summary: bool,
    ) -> Result<SubmitResponse, ExtractionApiError> {
        let form = Form::new()
            .part("file", file_part(filename, payload)?)
            .text("generate_summary", generate_summary.to_string());

        tracing::debug!(filename, generate_summary, "Submitting receipt");

        let response = self
            .client
            .post(format!("{}/api/v1/process-receipt", self.base_url))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Submit several documents in one request.
    ///
    /// Sends `POST /api/v1/process-receipt/bulk` with one `files` part
    /// per document. The response carries one item per file, keyed by
    /// filename.
    pub async fn submit_receipts_bulk(
        &self,
        files: Vec<(String, Vec<u8>)>,
        generate_summary: bool,
    ) -> Result<BulkSubmitResponse, ExtractionApiError> {
        let count = files.len();
        let mut form = Form::new();
        for (filename, payload) in files {
            form = form.part("files", file_part(&filename, payload)?);
        }
        form = form.text("generate_summary", generate_summary.to_string());

        tracing::debug!(count, generate_summary, "Submitting bulk extraction request");

        let response = self
            .client
            .post(format!("{}/api/v1/process-receipt/bulk", self.base_url))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current state of an asynchronous extraction task.
    pub async fn task_status(&self, task_id: &str) -> Result<TaskStatusResponse, ExtractionApiError> {
        let response = self
            .client
            .get(format!("{}/api/v1/tasks/{}", self.base_url, task_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the ordered list of prior extraction records.
    pub async fn fetch_history(&self) -> Result<Vec<HistoryRecord>, ExtractionApiError> {
        let response = self
            .client
            .get(format!("{}/api/v1/receipts/history", self.base_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the original document bytes for a stored receipt.
    pub async fn fetch_receipt_file(&self, receipt_id: i64) -> Result<Vec<u8>, ExtractionApiError> {
        let response = self
            .client
            .get(format!(
                "{}/api/v1/receipts/{}/file",
                self.base_url, receipt_id
            ))
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`ExtractionApiError::Api`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ExtractionApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ExtractionApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ExtractionApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ExtractionApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

/// Build a multipart file part with a content type guessed from the
/// filename extension.
fn file_part(filename: &str, payload: Vec<u8>) -> Result<Part, ExtractionApiError> {
    let part = Part::bytes(payload)
        .file_name(filename.to_owned())
        .mime_str(mime_for(filename))?;
    Ok(part)
}

/// Guess the MIME type from the filename extension.
///
/// The service accepts JPEG, PNG, and PDF; anything else is sent as an
/// octet stream and rejected remotely with a per-file error.
fn mime_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
