//! Shared scalar type aliases.

/// Database row identifier (BIGSERIAL).
pub type DbId = i64;

/// Timestamp type used across all persisted rows.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
