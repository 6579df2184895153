//! # Store Actor
//!
//! The server half of the in-memory coordination store. A single Tokio task owns
//! the key space and processes requests one at a time, which is what makes
//! `SetIfAbsent` atomic without any `Mutex`.

use crate::client::StoreClient;
use crate::message::StoreRequest;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

/// How often expired entries are purged when nobody touches them.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory key-value store with per-key expiry, run as an actor.
///
/// # Usage Pattern
///
/// 1.  **Create**: `StoreActor::new()` returns the actor and a cloneable [`StoreClient`].
/// 2.  **Run**: spawn `actor.run()` on the runtime.
/// 3.  **Use**: share the client (or `Arc<dyn CoordinationStore>`) with consumers.
///
/// ```rust
/// use coord_store::{CoordinationStore, StoreActor};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = StoreActor::new(16);
///     tokio::spawn(actor.run());
///
///     assert!(client.set_if_absent("k", "v".into(), Duration::from_secs(5)).await.unwrap());
///     assert!(!client.set_if_absent("k", "w".into(), Duration::from_secs(5)).await.unwrap());
///     assert_eq!(client.get("k").await.unwrap().as_deref(), Some("v"));
/// }
/// ```
///
/// Expiry is checked lazily on every access and, in addition, by a periodic
/// sweep so that keys nobody reads again do not accumulate. The actor exits
/// once every client has been dropped.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    entries: HashMap<String, Entry>,
    sweep_every: Duration,
}

impl StoreActor {
    /// Creates a new `StoreActor` and its associated `StoreClient`.
    ///
    /// `buffer_size` is the capacity of the request channel; callers wait for
    /// space when it is full.
    pub fn new(buffer_size: usize) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            entries: HashMap::new(),
            sweep_every: DEFAULT_SWEEP_INTERVAL,
        };
        (actor, StoreClient::new(sender))
    }

    pub fn with_sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_every = every;
        self
    }

    /// Runs the request loop until the channel closes.
    pub async fn run(mut self) {
        info!("Store started");

        let mut sweep = time::interval(self.sweep_every);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                msg = self.receiver.recv() => match msg {
                    Some(request) => self.handle(request),
                    None => break,
                },
                _ = sweep.tick() => self.sweep(),
            }
        }

        info!(size = self.entries.len(), "Shutdown");
    }

    fn handle(&mut self, request: StoreRequest) {
        let now = Instant::now();
        match request {
            StoreRequest::Get { key, respond_to } => {
                let value = self.live(&key, now).map(|entry| entry.value.clone());
                trace!(%key, found = value.is_some(), "Get");
                let _ = respond_to.send(Ok(value));
            }
            StoreRequest::Set {
                key,
                value,
                ttl,
                respond_to,
            } => {
                debug!(%key, ?ttl, "Set");
                self.entries.insert(
                    key,
                    Entry {
                        value,
                        expires_at: now + ttl,
                    },
                );
                let _ = respond_to.send(Ok(()));
            }
            StoreRequest::SetIfAbsent {
                key,
                value,
                ttl,
                respond_to,
            } => {
                let created = self.live(&key, now).is_none();
                if created {
                    self.entries.insert(
                        key.clone(),
                        Entry {
                            value,
                            expires_at: now + ttl,
                        },
                    );
                }
                debug!(%key, ?ttl, created, "SetIfAbsent");
                let _ = respond_to.send(Ok(created));
            }
            StoreRequest::Delete { key, respond_to } => {
                let existed = self.entries.remove(&key).is_some();
                debug!(%key, existed, "Delete");
                let _ = respond_to.send(Ok(()));
            }
        }
    }

    /// Returns the entry for `key` if it has not expired, evicting it otherwise.
    fn live(&mut self, key: &str, now: Instant) -> Option<&Entry> {
        let expired = matches!(self.entries.get(key), Some(entry) if !entry.is_live(now));
        if expired {
            self.entries.remove(key);
            trace!(%key, "Expired");
        }
        self.entries.get(key)
    }

    fn sweep(&mut self) {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let purged = before - self.entries.len();
        if purged > 0 {
            debug!(purged, size = self.entries.len(), "Sweep");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoordinationStore;

    const TTL: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_set_if_absent_only_first_caller_wins() {
        let (actor, client) = StoreActor::new(10);
        tokio::spawn(actor.run());

        assert!(client.set_if_absent("lock:a", "1".into(), TTL).await.unwrap());
        assert!(!client.set_if_absent("lock:a", "2".into(), TTL).await.unwrap());

        // The losing write must not overwrite the value
        assert_eq!(client.get("lock:a").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_set_overwrites_and_delete_removes() {
        let (actor, client) = StoreActor::new(10);
        tokio::spawn(actor.run());

        client.set("k", "one".into(), TTL).await.unwrap();
        client.set("k", "two".into(), TTL).await.unwrap();
        assert_eq!(client.get("k").await.unwrap().as_deref(), Some("two"));

        client.delete("k").await.unwrap();
        assert_eq!(client.get("k").await.unwrap(), None);

        // Deleting an absent key is fine
        client.delete("k").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let (actor, client) = StoreActor::new(10);
        tokio::spawn(actor.run());

        assert!(client.set_if_absent("lease", "x".into(), TTL).await.unwrap());

        time::advance(Duration::from_secs(4)).await;
        assert!(client.get("lease").await.unwrap().is_some());

        time::advance(Duration::from_secs(2)).await;
        assert_eq!(client.get("lease").await.unwrap(), None);

        // An expired key is absent for set_if_absent too
        assert!(client.set_if_absent("lease", "y".into(), TTL).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_refreshes_ttl() {
        let (actor, client) = StoreActor::new(10);
        tokio::spawn(actor.run());

        client.set("k", "v".into(), TTL).await.unwrap();
        time::advance(Duration::from_secs(4)).await;
        client
            .set("k", "v2".into(), Duration::from_secs(60))
            .await
            .unwrap();
        time::advance(Duration::from_secs(10)).await;

        assert_eq!(client.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_concurrent_set_if_absent_single_winner() {
        let (actor, client) = StoreActor::new(64);
        tokio::spawn(actor.run());

        let mut handles = vec![];
        for i in 0..32 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                client
                    .set_if_absent("contended", i.to_string(), TTL)
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_actor_stops_when_clients_dropped() {
        let (actor, client) = StoreActor::new(10);
        let handle = tokio::spawn(actor.run());

        client.set("k", "v".into(), TTL).await.unwrap();
        drop(client);

        handle.await.expect("store actor panicked");
    }
}
