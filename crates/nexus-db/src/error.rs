//! Database-specific error types and conversions.

use nexus_core::error::NexusError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique constraint violated: {entity}")]
    Duplicate { entity: String },

    #[error("Stored record could not be decoded: {0}")]
    Decode(String),
}

impl From<DbError> for NexusError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => NexusError::NotFound { entity, id },
            DbError::Duplicate { entity } => NexusError::DuplicateConflict { entity },
            other => NexusError::Database(other.to_string()),
        }
    }
}

/// Classify a write failure: unique-index violations become
/// [`DbError::Duplicate`] so callers see a domain-level conflict
/// instead of a raw storage error.
pub(crate) fn classify_write_error(err: surrealdb::Error, entity: &str) -> DbError {
    if err.to_string().contains("already contains") {
        DbError::Duplicate {
            entity: entity.to_string(),
        }
    } else {
        DbError::Surreal(err)
    }
}
