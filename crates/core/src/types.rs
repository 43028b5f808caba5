/// Client-generated entry identifiers are UUIDv4, stable for the
/// entry's lifetime and never reused.
pub type EntryId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
