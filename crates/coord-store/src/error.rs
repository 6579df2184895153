//! # Store Errors
//!
//! Errors surfaced by any [`CoordinationStore`](crate::CoordinationStore) backend.
//! A missing key is never an error; it is reported as `Ok(None)` by `get`.

/// Errors that can occur while talking to the coordination store.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store closed")]
    Closed,
    #[error("Store dropped response channel")]
    Dropped,
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
