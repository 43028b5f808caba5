//! Asynchronous job submission and polling orchestration.
//!
//! [`BatchOrchestrator`](orchestrator::BatchOrchestrator) owns the
//! tracked job set and drives each batch run from submission through
//! polling to settlement. [`single`] holds the one-document variant
//! with its bounded retry loop. Both talk to the remote service through
//! the [`ReceiptService`](reciva_client::ReceiptService) seam.

pub mod events;
pub mod orchestrator;
pub mod poller;
pub mod single;

pub use events::BatchEvent;
pub use orchestrator::{BatchOrchestrator, BatchState, OrchestratorError};
pub use poller::PollConfig;
pub use single::{SingleConfig, SingleJobError, SingleProcessor};
