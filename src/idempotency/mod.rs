//! # Idempotency Coordinator
//!
//! Deduplicates retried write requests by a caller-supplied token. The record
//! for a token moves `absent → IN_PROGRESS → COMPLETED` and expires on its own;
//! an abandoned attempt deletes it so the token can be retried.

mod coordinator;
mod error;

pub use coordinator::{Begin, IdempotencyCoordinator, IdempotencyTtl, InFlight, KEY_PREFIX};
pub use error::IdempotencyError;
