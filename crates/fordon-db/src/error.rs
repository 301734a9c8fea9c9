//! Database-specific error types and conversions.

use fordon_core::error::FordonError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {entity}")]
    Conflict { entity: String },
}

impl DbError {
    /// Classifies a failed write: unique-index violations surface as
    /// [`DbError::Conflict`], anything else as a query error. SurrealDB
    /// reports index violations as "index ... already contains ...".
    pub(crate) fn from_write(entity: &str, e: surrealdb::Error) -> Self {
        let message = e.to_string();
        if message.contains("already contains") {
            DbError::Conflict {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }
}

impl From<DbError> for FordonError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => FordonError::NotFound { entity, id },
            DbError::Conflict { entity } => FordonError::Conflict { entity },
            other => FordonError::Database(other.to_string()),
        }
    }
}
