//! Core error taxonomy
//!
//! Every ledger mutation surfaces one of these variants; the API layer
//! maps them onto HTTP statuses. State-precondition errors carry both
//! the limiting and the requested value.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::BatchStatus;

/// Domain errors
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// Caller lacks ownership or role
    #[error("{0}")]
    Forbidden(String),

    /// Duplicate of an existing record
    #[error("{0}")]
    Conflict(String),

    /// Requested quantity exceeds what the batch has left
    #[error("Insufficient quantity for batch {batch_code}. Available: {available}, Requested: {requested}")]
    InsufficientQuantity {
        batch_code: String,
        available: Decimal,
        requested: Decimal,
    },

    /// Wallet balance cannot cover the cost
    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    /// Batch is not in a status the operation accepts
    #[error("Batch {batch_code} has status {actual}, expected {expected}")]
    InvalidStatus {
        batch_code: String,
        actual: BatchStatus,
        expected: String,
    },

    /// Required reference data (status or event type) missing from the
    /// taxonomy. Fatal: never defaulted.
    #[error("Missing taxonomy entry: {0}")]
    Config(String),
}

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Validation error from anything displayable
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    /// Not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        CoreError::NotFound(msg.into())
    }

    /// Forbidden error
    pub fn forbidden(msg: impl Into<String>) -> Self {
        CoreError::Forbidden(msg.into())
    }
}
