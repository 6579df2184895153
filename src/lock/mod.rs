//! # Lock Manager
//!
//! Named, TTL-bounded leases on top of the coordination store. A lease is a bare
//! presence flag: no owner token, no reentrancy, no queueing. Acquisition never
//! waits; a held lease is reported as unavailable straight away.
//!
//! Multi-product callers use [`LockManager::lock_products`], which takes leases
//! in ascending product id order and returns a [`LeaseSet`] that must be
//! released when the protected work is done.

mod error;
mod manager;

pub use error::LockError;
pub use manager::{product_lock_key, LeaseSet, LockManager, LOCK_VALUE};
