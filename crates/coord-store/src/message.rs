//! # Store Messages
//!
//! The request enum exchanged between [`StoreClient`](crate::StoreClient) and
//! [`StoreActor`](crate::StoreActor). Each variant maps to one verb of the
//! [`CoordinationStore`](crate::CoordinationStore) contract and carries a
//! one-shot channel for the reply.

use crate::error::StoreError;
use std::time::Duration;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by the store actor.
pub type Response<T> = oneshot::Sender<Result<T, StoreError>>;

#[derive(Debug)]
pub enum StoreRequest {
    Get {
        key: String,
        respond_to: Response<Option<String>>,
    },
    Set {
        key: String,
        value: String,
        ttl: Duration,
        respond_to: Response<()>,
    },
    SetIfAbsent {
        key: String,
        value: String,
        ttl: Duration,
        respond_to: Response<bool>,
    },
    Delete {
        key: String,
        respond_to: Response<()>,
    },
}

impl StoreRequest {
    /// The key this request targets.
    pub fn key(&self) -> &str {
        match self {
            StoreRequest::Get { key, .. }
            | StoreRequest::Set { key, .. }
            | StoreRequest::SetIfAbsent { key, .. }
            | StoreRequest::Delete { key, .. } => key,
        }
    }
}
