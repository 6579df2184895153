//! # Store Client
//!
//! The cloneable handle used to talk to a [`StoreActor`](crate::StoreActor).

use crate::error::StoreError;
use crate::message::StoreRequest;
use crate::store::CoordinationStore;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// A type-safe client for the in-memory coordination store.
///
/// Holds only the channel sender, so cloning is cheap and clones can be moved
/// into any number of tasks. Once the actor is gone every call fails with
/// [`StoreError::Closed`].
#[derive(Clone, Debug)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, StoreError>>) -> StoreRequest,
    ) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Dropped)?
    }
}

#[async_trait]
impl CoordinationStore for StoreClient {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = key.to_string();
        self.call(|respond_to| StoreRequest::Get { key, respond_to })
            .await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let key = key.to_string();
        self.call(|respond_to| StoreRequest::Set {
            key,
            value,
            ttl,
            respond_to,
        })
        .await
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let key = key.to_string();
        self.call(|respond_to| StoreRequest::SetIfAbsent {
            key,
            value,
            ttl,
            respond_to,
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.call(|respond_to| StoreRequest::Delete { key, respond_to })
            .await
    }
}
