use crate::types::EntryId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}
