//! Crate-level error taxonomy.
//!
//! Every component has its own `thiserror` enum; they all converge here so the
//! `OrderDesk` surface exposes one error type whose variants callers can match
//! on instead of inspecting messages.

use crate::idempotency::IdempotencyError;
use crate::inventory::LedgerError;
use crate::lock::LockError;
use crate::model::ProductId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    /// Malformed input, rejected before any mutation.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    /// A product lease is held by a concurrent request.
    #[error("Lock unavailable: {0}")]
    LockUnavailable(String),

    /// The idempotency token is still being processed by another request.
    #[error("Request with idempotency key {0} is already in progress")]
    DuplicateInProgress(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Coordination store unavailable: {0}")]
    CoordinationUnavailable(String),
}

impl From<LedgerError> for ServiceError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(id) => ServiceError::NotFound(id.to_string()),
            LedgerError::InsufficientStock {
                product_id,
                requested,
                available,
            } => ServiceError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            LedgerError::Invalid(msg) => ServiceError::Validation(msg),
            LedgerError::Database(e) => ServiceError::Persistence(e.to_string()),
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Persistence(format!("response encoding: {e}"))
    }
}

impl From<LockError> for ServiceError {
    fn from(e: LockError) -> Self {
        match e {
            LockError::Unavailable(name) => ServiceError::LockUnavailable(name),
            LockError::Store(e) => ServiceError::CoordinationUnavailable(e.to_string()),
        }
    }
}

impl From<IdempotencyError> for ServiceError {
    fn from(e: IdempotencyError) -> Self {
        ServiceError::CoordinationUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coord_store::StoreError;

    #[test]
    fn test_component_errors_map_to_kinds() {
        assert_eq!(
            ServiceError::from(LedgerError::NotFound(ProductId(3))),
            ServiceError::NotFound("product_3".into())
        );
        assert_eq!(
            ServiceError::from(LockError::Unavailable("lock:product:3".into())),
            ServiceError::LockUnavailable("lock:product:3".into())
        );
        assert!(matches!(
            ServiceError::from(LockError::Store(StoreError::Closed)),
            ServiceError::CoordinationUnavailable(_)
        ));
        assert!(matches!(
            ServiceError::from(IdempotencyError::Unavailable(StoreError::Dropped)),
            ServiceError::CoordinationUnavailable(_)
        ));
        assert!(matches!(
            ServiceError::from(LedgerError::Database(sqlx::Error::RowNotFound)),
            ServiceError::Persistence(_)
        ));
    }
}
