/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Opaque string identifier used for jobs, conversations and messages.
pub type EntityId = String;
