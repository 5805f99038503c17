//! Error types for order operations.

use thiserror::Error;

use crate::model::UnknownStatus;
use crate::storage::StorageError;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The order data provided is malformed or incomplete.
    #[error("invalid order data: {0}")]
    Validation(String),

    /// The requested order was not found.
    #[error("order not found: {0}")]
    NotFound(i64),

    /// The status is not one of pending, preparing, ready, completed, cancelled.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// The store failed; nothing was partially applied.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<StorageError> for OrderError {
    fn from(err: StorageError) -> Self {
        OrderError::Persistence(err.to_string())
    }
}

impl From<UnknownStatus> for OrderError {
    fn from(err: UnknownStatus) -> Self {
        OrderError::InvalidStatus(err.0)
    }
}
