use coord_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdempotencyError {
    #[error("Idempotency store unavailable: {0}")]
    Unavailable(#[from] StoreError),

    /// The stored record is not valid JSON for an idempotency record.
    #[error("Corrupt idempotency record: {0}")]
    Corrupt(#[from] serde_json::Error),
}
