use crate::config::ServiceConfig;
use crate::idempotency::{IdempotencyCoordinator, IdempotencyTtl};
use crate::inventory::InventoryLedger;
use crate::lock::LockManager;
use crate::service::OrderDesk;
use crate::storage;
use coord_store::{CoordinationStore, StoreActor};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{error, info};

/// Owns every long-lived handle of a running system.
///
/// `OrderSystem` is responsible for:
/// - **Lifecycle Management**: spawning the coordination store actor, opening and
///   migrating the database, and tearing both down again
/// - **Dependency Wiring**: handing the same pool and store to every component
///
/// # Example
///
/// ```ignore
/// let system = OrderSystem::start(&ServiceConfig::default()).await?;
/// storage::seed_demo_products(system.pool()).await?;
///
/// let outcome = system.desk.create_order("req-1", params).await?;
///
/// system.shutdown().await?;
/// ```
pub struct OrderSystem {
    /// The inbound surface
    pub desk: OrderDesk,

    pub ledger: InventoryLedger,

    pub locks: LockManager,

    pub idempotency: IdempotencyCoordinator,

    pool: SqlitePool,

    store: Arc<dyn CoordinationStore>,

    /// Store actor task (awaited on shutdown)
    handle: tokio::task::JoinHandle<()>,
}

impl OrderSystem {
    /// Starts the store actor, connects and migrates the database, and wires
    /// all components.
    pub async fn start(config: &ServiceConfig) -> Result<Self, sqlx::Error> {
        let (actor, client) = StoreActor::new(config.store_buffer);
        let handle = tokio::spawn(actor.run());
        let store: Arc<dyn CoordinationStore> = Arc::new(client);

        let pool = storage::connect(&config.database_url, config.max_connections).await?;
        storage::migrate(&pool).await?;

        let system = Self {
            desk: OrderDesk::new(pool.clone(), store.clone(), config),
            ledger: InventoryLedger::new(pool.clone()),
            locks: LockManager::new(store.clone(), config.lock_ttl),
            idempotency: IdempotencyCoordinator::new(
                store.clone(),
                IdempotencyTtl {
                    in_progress: config.in_progress_ttl,
                    completed: config.completed_ttl,
                },
            ),
            pool,
            store,
            handle,
        };

        info!(url = %config.database_url, "System started");
        Ok(system)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn store(&self) -> Arc<dyn CoordinationStore> {
        self.store.clone()
    }

    /// Gracefully shuts down the system.
    ///
    /// Drops every store client so the actor's channel closes, waits for the
    /// actor task, then closes the pool. Clones of the desk or store held
    /// elsewhere keep the actor alive; drop them first.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        let Self {
            desk,
            ledger,
            locks,
            idempotency,
            pool,
            store,
            handle,
        } = self;
        drop((desk, ledger, locks, idempotency, store));

        if let Err(e) = handle.await {
            error!("Store task failed: {:?}", e);
            return Err(format!("Store task failed: {:?}", e));
        }

        pool.close().await;
        info!("System shutdown complete.");
        Ok(())
    }
}
