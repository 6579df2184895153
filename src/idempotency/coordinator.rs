use super::IdempotencyError;
use crate::model::{IdempotencyRecord, IdempotencyStatus};
use coord_store::CoordinationStore;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Prefix of every idempotency key in the coordination store.
pub const KEY_PREFIX: &str = "idempotency:";

/// A record can vanish between a failed create and the follow-up read
/// (expiry or abandon); `begin` retries that many times before giving up.
const BEGIN_ATTEMPTS: usize = 3;

/// Lifetimes of the two record states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyTtl {
    /// How long an IN_PROGRESS record blocks retries if its owner never finishes.
    pub in_progress: Duration,
    /// How long a COMPLETED response is replayed.
    pub completed: Duration,
}

impl Default for IdempotencyTtl {
    fn default() -> Self {
        Self {
            in_progress: Duration::from_secs(5 * 60),
            completed: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Result of [`IdempotencyCoordinator::begin`].
pub enum Begin {
    /// The token was unseen; the caller owns the in-flight window.
    Fresh(InFlight),
    /// Another request with this token is still running.
    InProgress,
    /// The token already completed; replay this body verbatim.
    Completed(String),
}

impl fmt::Debug for Begin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Begin::Fresh(flight) => f.debug_tuple("Fresh").field(&flight.token).finish(),
            Begin::InProgress => f.write_str("InProgress"),
            Begin::Completed(body) => f.debug_tuple("Completed").field(body).finish(),
        }
    }
}

#[derive(Clone)]
pub struct IdempotencyCoordinator {
    store: Arc<dyn CoordinationStore>,
    ttl: IdempotencyTtl,
}

impl IdempotencyCoordinator {
    pub fn new(store: Arc<dyn CoordinationStore>, ttl: IdempotencyTtl) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> IdempotencyTtl {
        self.ttl
    }

    fn key(token: &str) -> String {
        format!("{KEY_PREFIX}{token}")
    }

    /// Marks `token` IN_PROGRESS if it is unseen, otherwise reports its state.
    ///
    /// Concurrent calls with the same unseen token: exactly one gets
    /// [`Begin::Fresh`].
    #[instrument(skip(self))]
    pub async fn begin(&self, token: &str) -> Result<Begin, IdempotencyError> {
        let key = Self::key(token);
        let pending = serde_json::to_string(&IdempotencyRecord::in_progress())?;

        for attempt in 1..=BEGIN_ATTEMPTS {
            if self
                .store
                .set_if_absent(&key, pending.clone(), self.ttl.in_progress)
                .await?
            {
                info!("Fresh token");
                return Ok(Begin::Fresh(InFlight {
                    coordinator: self.clone(),
                    token: Some(token.to_string()),
                }));
            }

            let Some(raw) = self.store.get(&key).await? else {
                debug!(attempt, "Record vanished before read; retrying");
                continue;
            };
            let record: IdempotencyRecord = serde_json::from_str(&raw)?;
            return Ok(match record.status {
                IdempotencyStatus::InProgress => {
                    info!("Token in progress");
                    Begin::InProgress
                }
                IdempotencyStatus::Completed => {
                    info!("Token completed; replaying");
                    Begin::Completed(record.response.unwrap_or_default())
                }
            });
        }

        warn!("Record kept vanishing; treating as in progress");
        Ok(Begin::InProgress)
    }

    /// Overwrites the record with COMPLETED and `body`, refreshing its TTL.
    #[instrument(skip(self, body))]
    pub async fn complete(&self, token: &str, body: &str) -> Result<(), IdempotencyError> {
        let record = serde_json::to_string(&IdempotencyRecord::completed(body))?;
        self.store
            .set(&Self::key(token), record, self.ttl.completed)
            .await?;
        info!("Completed");
        Ok(())
    }

    /// Deletes the record so the token can be retried.
    #[instrument(skip(self))]
    pub async fn abandon(&self, token: &str) -> Result<(), IdempotencyError> {
        self.store.delete(&Self::key(token)).await?;
        info!("Abandoned");
        Ok(())
    }
}

/// Ownership of an IN_PROGRESS record.
///
/// Finish with [`complete`](Self::complete) or [`abandon`](Self::abandon).
/// Dropping it unfinished leaves the record IN_PROGRESS until the in-flight
/// TTL lapses: the owner may already have committed, so the token must not
/// become retryable behind its back.
#[must_use = "an unfinished token blocks retries until it expires"]
pub struct InFlight {
    coordinator: IdempotencyCoordinator,
    token: Option<String>,
}

impl InFlight {
    pub fn token(&self) -> &str {
        self.token.as_deref().unwrap_or_default()
    }

    /// Stores `body` as the response for this token.
    ///
    /// On failure the record is left IN_PROGRESS: the guarded side effects have
    /// already happened, so the token must not become retryable.
    pub async fn complete(mut self, body: &str) -> Result<(), IdempotencyError> {
        match self.token.take() {
            Some(token) => self.coordinator.complete(&token, body).await,
            None => Ok(()),
        }
    }

    pub async fn abandon(mut self) -> Result<(), IdempotencyError> {
        match self.token.take() {
            Some(token) => self.coordinator.abandon(&token).await,
            None => Ok(()),
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            warn!(
                %token,
                ttl = ?self.coordinator.ttl.in_progress,
                "In-flight token dropped unfinished; blocked until expiry"
            );
        }
    }
}
