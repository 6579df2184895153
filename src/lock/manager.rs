use super::LockError;
use crate::model::ProductId;
use coord_store::{CoordinationStore, StoreError};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Value written under every lease key.
pub const LOCK_VALUE: &str = "locked";

/// Store key of the lease guarding one product's stock.
pub fn product_lock_key(id: ProductId) -> String {
    format!("lock:product:{}", id.0)
}

#[derive(Clone)]
pub struct LockManager {
    store: Arc<dyn CoordinationStore>,
    ttl: Duration,
}

impl LockManager {
    /// `ttl` is the lease length used by [`lock_products`](Self::lock_products).
    pub fn new(store: Arc<dyn CoordinationStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Tries once to establish the lease `name`. `Ok(true)` iff this call created it.
    pub async fn acquire(&self, name: &str, ttl: Duration) -> Result<bool, StoreError> {
        let acquired = self
            .store
            .set_if_absent(name, LOCK_VALUE.to_string(), ttl)
            .await?;
        debug!(lock = name, acquired, "Acquire");
        Ok(acquired)
    }

    /// Deletes the lease regardless of who established it.
    pub async fn release(&self, name: &str) -> Result<(), StoreError> {
        self.store.delete(name).await?;
        debug!(lock = name, "Release");
        Ok(())
    }

    /// Acquires one lease per distinct product, in ascending id order.
    ///
    /// If any lease is held elsewhere, or the store fails, the leases already
    /// taken by this call are released before the error is returned.
    #[instrument(skip(self, ids))]
    pub async fn lock_products(
        &self,
        ids: impl IntoIterator<Item = ProductId>,
    ) -> Result<LeaseSet, LockError> {
        let ordered: BTreeSet<ProductId> = ids.into_iter().collect();
        let mut held = Vec::with_capacity(ordered.len());

        for id in ordered {
            let name = product_lock_key(id);
            let outcome = self.acquire(&name, self.ttl).await;
            match outcome {
                Ok(true) => held.push(name),
                Ok(false) => {
                    info!(lock = %name, "Lock held elsewhere");
                    self.release_all(&held).await;
                    return Err(LockError::Unavailable(name));
                }
                Err(e) => {
                    warn!(lock = %name, error = %e, "Lock acquire failed");
                    self.release_all(&held).await;
                    return Err(LockError::Store(e));
                }
            }
        }

        info!(count = held.len(), "Locks acquired");
        Ok(LeaseSet {
            manager: self.clone(),
            names: held,
        })
    }

    async fn release_all(&self, names: &[String]) {
        for name in names.iter().rev() {
            if let Err(e) = self.release(name).await {
                warn!(lock = %name, error = %e, "Lock release failed");
            }
        }
    }
}

/// Leases taken together by [`LockManager::lock_products`].
///
/// Call [`release`](Self::release) once the protected work is finished. A set
/// dropped without being released schedules the deletes on the current Tokio
/// runtime; without one, the leases are left to expire.
#[must_use = "leases stay held until released or expired"]
pub struct LeaseSet {
    manager: LockManager,
    names: Vec<String>,
}

impl LeaseSet {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Releases every lease in reverse acquisition order.
    pub async fn release(mut self) {
        let names = std::mem::take(&mut self.names);
        self.manager.release_all(&names).await;
        debug!(count = names.len(), "Locks released");
    }
}

impl Drop for LeaseSet {
    fn drop(&mut self) {
        if self.names.is_empty() {
            return;
        }
        let names = std::mem::take(&mut self.names);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let manager = self.manager.clone();
                handle.spawn(async move { manager.release_all(&names).await });
            }
            Err(_) => warn!(?names, "Leases dropped outside a runtime; waiting for expiry"),
        }
    }
}
