//! HTTP client for the remote receipt extraction service.
//!
//! [`ExtractionApi`] wraps the service's REST endpoints with
//! [`reqwest`]. [`ReceiptService`] is the narrow seam the batch
//! orchestrator consumes, so tests can substitute a scripted in-memory
//! implementation for the real HTTP layer.

pub mod api;
pub mod responses;
pub mod service;

pub use api::{ExtractionApi, ExtractionApiError};
pub use service::ReceiptService;
