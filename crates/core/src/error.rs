//! Domain error taxonomy.
//!
//! Validation errors surface synchronously to the caller and are never
//! persisted. Everything infrastructure-specific (sqlx, storage, HTTP) is
//! wrapped at the layer that produces it.

/// Domain-level error shared across crates.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup by identifier found nothing.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A malformed submission or parameter.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}
