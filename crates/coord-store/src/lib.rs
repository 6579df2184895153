//! # Coordination Store
//!
//! A small shared key-value store with per-key expiry. It offers exactly the
//! four verbs that distributed locks and idempotency records need:
//!
//! | Verb | Semantics |
//! |------|-----------|
//! | `get` | Value of a live key, `None` when absent or expired |
//! | `set` | Unconditional write with a fresh TTL |
//! | `set_if_absent` | Atomic create; `true` only for the caller that created the key |
//! | `delete` | Remove a key; absent keys are fine |
//!
//! Consumers depend on the [`CoordinationStore`] trait. The bundled backend is
//! an actor: [`StoreActor`] owns the key space on a single Tokio task and
//! [`StoreClient`] sends it requests over an `mpsc` channel, each carrying a
//! `oneshot` sender for the reply. Sequential processing inside the actor is
//! what makes `set_if_absent` atomic.
//!
//! ```rust
//! use coord_store::{CoordinationStore, StoreActor};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = StoreActor::new(32);
//!     tokio::spawn(actor.run());
//!
//!     let store: Arc<dyn CoordinationStore> = Arc::new(client);
//!     store.set("greeting", "hello".into(), Duration::from_secs(60)).await.unwrap();
//!     assert_eq!(store.get("greeting").await.unwrap().as_deref(), Some("hello"));
//! }
//! ```
//!
//! See [`mock`] for testing callers without a live actor.

pub mod actor;
pub mod client;
pub mod error;
pub mod message;
pub mod mock;
pub mod store;

pub use actor::StoreActor;
pub use client::StoreClient;
pub use error::StoreError;
pub use message::{Response, StoreRequest};
pub use store::CoordinationStore;
