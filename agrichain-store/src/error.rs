//! Store error types

use agrichain_core::CoreError;
use thiserror::Error;

/// Storage errors: either a domain rejection bubbled up from a planner
/// or an infrastructure failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Domain-level rejection (validation, ownership, quantity, ...)
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(String),
}

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => {
                StoreError::Domain(CoreError::not_found("Record not found"))
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}
