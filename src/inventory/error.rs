//! Error types for the inventory ledger.

use crate::model::ProductId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Product not found: {0}")]
    NotFound(ProductId),

    /// The conditional decrement matched no row.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        requested: i64,
        available: i64,
    },

    #[error("Invalid inventory input: {0}")]
    Invalid(String),

    #[error("Inventory database error: {0}")]
    Database(#[from] sqlx::Error),
}
