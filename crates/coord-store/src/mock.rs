//! # Mock Store & Testing Guide
//!
//! [`MockStore`] hands out a real [`StoreClient`] whose requests are answered
//! from a queue of expectations instead of a key space. Use it to test code that
//! sits *around* the store, especially failure paths that the in-memory actor
//! never produces (an unreachable backend, a dropped reply).
//!
//! | Feature | MockStore | StoreActor |
//! |---------|-----------|------------|
//! | **State** | None (scripted replies) | Real keys with expiry |
//! | **Determinism** | Fully scripted | Subject to scheduler |
//! | **Error Injection** | Easy (`return_err`) | Not possible |
//! | **Use Case** | Failure handling in callers | Lock and idempotency behaviour |
//!
//! ```rust
//! use coord_store::mock::MockStore;
//! use coord_store::{CoordinationStore, StoreError};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockStore::new();
//!     mock.expect_set_if_absent("lock:product:1").return_ok(true);
//!     mock.expect_get("idempotency:abc")
//!         .return_err(StoreError::Unavailable("connection reset".into()));
//!
//!     let store = mock.client();
//!     assert!(store.set_if_absent("lock:product:1", "locked".into(), Duration::from_secs(5)).await.unwrap());
//!     assert!(store.get("idempotency:abc").await.is_err());
//!
//!     mock.verify();
//! }
//! ```
//!
//! For step-by-step control, [`create_mock_store`] returns the client together
//! with the raw request receiver, and the `expect_*` helpers pull the next
//! request off it.

use crate::client::StoreClient;
use crate::error::StoreError;
use crate::message::{Response, StoreRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

enum Reply {
    Get(Result<Option<String>, StoreError>),
    Set(Result<(), StoreError>),
    SetIfAbsent(Result<bool, StoreError>),
    Delete(Result<(), StoreError>),
}

struct Expectation {
    key: String,
    reply: Reply,
}

type Expectations = Arc<Mutex<VecDeque<Expectation>>>;

/// A scripted store with expectation tracking for fluent testing.
///
/// Requests must arrive in the order the expectations were registered; a
/// request for a different verb or key panics the responder task, which the
/// caller then observes as [`StoreError::Dropped`].
pub struct MockStore {
    client: StoreClient,
    expectations: Expectations,
    _handle: tokio::task::JoinHandle<()>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Creates a new mock store with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<StoreRequest>(100);
        let expectations: Expectations = Arc::new(Mutex::new(VecDeque::new()));
        let queue = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let next = queue.lock().unwrap().pop_front();
                let Some(Expectation { key, reply }) = next else {
                    panic!("Unexpected request for key {}", request.key());
                };
                assert_eq!(request.key(), key, "Request for unexpected key");

                match (request, reply) {
                    (StoreRequest::Get { respond_to, .. }, Reply::Get(response)) => {
                        let _ = respond_to.send(response);
                    }
                    (StoreRequest::Set { respond_to, .. }, Reply::Set(response)) => {
                        let _ = respond_to.send(response);
                    }
                    (StoreRequest::SetIfAbsent { respond_to, .. }, Reply::SetIfAbsent(response)) => {
                        let _ = respond_to.send(response);
                    }
                    (StoreRequest::Delete { respond_to, .. }, Reply::Delete(response)) => {
                        let _ = respond_to.send(response);
                    }
                    (request, _) => {
                        panic!("Expectation mismatch for key {}", request.key());
                    }
                }
            }
        });

        Self {
            client: StoreClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> StoreClient {
        self.client.clone()
    }

    pub fn expect_get(&mut self, key: &str) -> ExpectationBuilder<Option<String>> {
        ExpectationBuilder::new(key, self.expectations.clone(), Reply::Get)
    }

    pub fn expect_set(&mut self, key: &str) -> ExpectationBuilder<()> {
        ExpectationBuilder::new(key, self.expectations.clone(), Reply::Set)
    }

    pub fn expect_set_if_absent(&mut self, key: &str) -> ExpectationBuilder<bool> {
        ExpectationBuilder::new(key, self.expectations.clone(), Reply::SetIfAbsent)
    }

    pub fn expect_delete(&mut self, key: &str) -> ExpectationBuilder<()> {
        ExpectationBuilder::new(key, self.expectations.clone(), Reply::Delete)
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().unwrap().len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

/// Builder for a single expectation; finish it with `return_ok` or `return_err`.
pub struct ExpectationBuilder<T> {
    key: String,
    expectations: Expectations,
    wrap: fn(Result<T, StoreError>) -> Reply,
}

impl<T> ExpectationBuilder<T> {
    fn new(key: &str, expectations: Expectations, wrap: fn(Result<T, StoreError>) -> Reply) -> Self {
        Self {
            key: key.to_string(),
            expectations,
            wrap,
        }
    }

    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: T) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: StoreError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<T, StoreError>) {
        self.expectations.lock().unwrap().push_back(Expectation {
            key: self.key,
            reply: (self.wrap)(response),
        });
    }
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

/// Creates a store client and the receiver its requests land on.
///
/// The test plays the part of the actor: pull requests with the `expect_*`
/// helpers below and answer through the returned responder.
pub fn create_mock_store(buffer_size: usize) -> (StoreClient, mpsc::Receiver<StoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (StoreClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(String, Response<Option<String>>)> {
    match receiver.recv().await {
        Some(StoreRequest::Get { key, respond_to }) => Some((key, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Set request
pub async fn expect_set(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(String, String, Duration, Response<()>)> {
    match receiver.recv().await {
        Some(StoreRequest::Set {
            key,
            value,
            ttl,
            respond_to,
        }) => Some((key, value, ttl, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a SetIfAbsent request
pub async fn expect_set_if_absent(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(String, String, Duration, Response<bool>)> {
    match receiver.recv().await {
        Some(StoreRequest::SetIfAbsent {
            key,
            value,
            ttl,
            respond_to,
        }) => Some((key, value, ttl, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Delete request
pub async fn expect_delete(
    receiver: &mut mpsc::Receiver<StoreRequest>,
) -> Option<(String, Response<()>)> {
    match receiver.recv().await {
        Some(StoreRequest::Delete { key, respond_to }) => Some((key, respond_to)),
        _ => None,
    }
}
