//! # CoordinationStore Trait
//!
//! The contract every coordination backend satisfies. Lock managers and
//! idempotency coordinators depend on this trait only, so the in-memory
//! [`StoreClient`](crate::StoreClient) can be swapped for a networked backend
//! without touching them.

use crate::error::StoreError;
use async_trait::async_trait;
use std::time::Duration;

/// A shared key-value store with per-key expiry.
///
/// # Atomicity
/// `set_if_absent` must be atomic with respect to every other operation on the
/// same key: when several callers race on an absent key, exactly one of them
/// observes `Ok(true)`.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// `GET key`. Expired keys read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// `SET key value TTL`, overwriting any previous value and expiry.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// `SET-IF-ABSENT key value TTL`. Returns `true` iff this call created the key.
    async fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// `DEL key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
