//! Error types for the lock manager.

use coord_store::StoreError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LockError {
    /// Another caller currently holds the lease.
    #[error("Lock unavailable: {0}")]
    Unavailable(String),

    /// The coordination store could not be reached.
    #[error("Lock store error: {0}")]
    Store(#[from] StoreError),
}
