//! # Order Desk
//!
//! > **Idempotent, lock-protected order creation over a shared inventory.**
//!
//! Orders are placed against products whose stock is shared by many concurrent,
//! possibly retried requests. Three mechanisms keep that safe:
//!
//! 1. **Idempotency** ([`idempotency`]): every write carries a client token. The
//!    first request with a token runs; repeats either wait their turn
//!    (`DuplicateInProgress`) or get the cached response back byte for byte.
//! 2. **Leases** ([`lock`]): one TTL-bounded lease per product, taken in
//!    ascending id order before the database transaction opens.
//! 3. **Conditional decrements** ([`inventory`]): stock is reduced with
//!    `WHERE stock >= ?`, so committed work can never drive it below zero.
//!
//! [`orders::OrderOrchestrator`] strings them together and
//! [`service::OrderDesk`] is the surface callers use.
//!
//! ## 🗺️ Module Tour
//!
//! - **[`model`]**: serializable data (`Product`, `Order`, `IdempotencyRecord`).
//! - **[`lock`]**, **[`idempotency`]**: built on the
//!   [`coord_store::CoordinationStore`] trait, so the in-memory actor store can
//!   be swapped for a networked one.
//! - **[`inventory`]**, **[`orders`]**, **[`storage`]**: the relational side, on
//!   `sqlx` + SQLite.
//! - **[`service`]**: `OrderDesk` and the `Outcome` of idempotent writes.
//! - **[`config`]**, **[`lifecycle`]**: environment configuration, wiring,
//!   shutdown and tracing setup.
//!
//! ## 🧪 Testing
//!
//! See [`coord_store::mock`] for scripting store failures, and the `tests/`
//! directory for concurrency and replay scenarios against a real system.

pub mod config;
pub mod error;
pub mod idempotency;
pub mod inventory;
pub mod lifecycle;
pub mod lock;
pub mod model;
pub mod orders;
pub mod service;
pub mod storage;

pub use config::ServiceConfig;
pub use error::ServiceError;
pub use lifecycle::OrderSystem;
pub use service::{OrderDesk, Outcome};
