//! # Order Desk
//!
//! The inbound surface. Write operations take an idempotency token and run
//! inside [`IdempotencyCoordinator`] guards; reads go straight to the stores.
//!
//! | Operation | Token | Result |
//! |-----------|-------|--------|
//! | [`create_order`](OrderDesk::create_order) | required | [`Outcome`] with an `Order` body |
//! | [`update_product_stock`](OrderDesk::update_product_stock) | required | [`Outcome`] with a `StockAck` body |
//! | [`get_order`](OrderDesk::get_order) | no | `Order` |
//! | [`list_products`](OrderDesk::list_products) | no | `Vec<Product>` |

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::idempotency::{Begin, IdempotencyCoordinator, IdempotencyTtl, InFlight};
use crate::inventory::{InventoryLedger, StockAdjuster};
use crate::lock::LockManager;
use crate::model::{Order, OrderCreate, OrderId, Product, ProductId};
use crate::orders::{OrderOrchestrator, OrderRepository};
use coord_store::CoordinationStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use std::future::Future;
use std::sync::Arc;
use tracing::{info, instrument, warn, Instrument};

/// Response of an idempotent write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation ran for this call; `body` is now cached under the token.
    Created(String),
    /// The token had already completed; `body` is the cached response, byte for byte.
    Replayed(String),
}

impl Outcome {
    pub fn body(&self) -> &str {
        match self {
            Outcome::Created(body) | Outcome::Replayed(body) => body,
        }
    }

    pub fn is_replay(&self) -> bool {
        matches!(self, Outcome::Replayed(_))
    }

    /// Decodes the JSON body.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(self.body())
    }
}

#[derive(Clone)]
pub struct OrderDesk {
    idempotency: IdempotencyCoordinator,
    orchestrator: OrderOrchestrator,
    adjuster: StockAdjuster,
    ledger: InventoryLedger,
    orders: OrderRepository,
}

impl OrderDesk {
    /// Wires every component from a pool and a coordination store.
    pub fn new(pool: SqlitePool, store: Arc<dyn CoordinationStore>, config: &ServiceConfig) -> Self {
        let locks = LockManager::new(store.clone(), config.lock_ttl);
        let idempotency = IdempotencyCoordinator::new(
            store,
            IdempotencyTtl {
                in_progress: config.in_progress_ttl,
                completed: config.completed_ttl,
            },
        );
        let ledger = InventoryLedger::new(pool.clone());
        let orders = OrderRepository::new(pool.clone());

        Self {
            orchestrator: OrderOrchestrator::new(pool, ledger.clone(), orders.clone(), locks.clone()),
            adjuster: StockAdjuster::new(ledger.clone(), locks),
            idempotency,
            ledger,
            orders,
        }
    }

    #[instrument(skip(self, params), fields(token = %token))]
    pub async fn create_order(&self, token: &str, params: OrderCreate) -> Result<Outcome, ServiceError> {
        let orchestrator = self.orchestrator.clone();
        self.guarded(token, async move { orchestrator.create_order(&params).await })
            .await
    }

    #[instrument(skip(self), fields(token = %token, product_id = %product_id))]
    pub async fn update_product_stock(
        &self,
        token: &str,
        product_id: ProductId,
        new_stock: i64,
    ) -> Result<Outcome, ServiceError> {
        if new_stock < 0 {
            return Err(ServiceError::Validation(format!("negative stock {new_stock}")));
        }
        let adjuster = self.adjuster.clone();
        self.guarded(token, async move { adjuster.set_stock(product_id, new_stock).await })
            .await
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order, ServiceError> {
        self.orders
            .get_with_items(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.ledger.list_products().await?)
    }

    /// Runs `op` at most once per token and caches its JSON response.
    ///
    /// After `begin`, the operation and its `complete`/`abandon` run on their
    /// own task, so a caller that goes away cannot cut the sequence between a
    /// commit and the cached response. Any failure of `op` abandons the token so
    /// the caller may retry.
    async fn guarded<T, F>(&self, token: &str, op: F) -> Result<Outcome, ServiceError>
    where
        T: Serialize + Send + 'static,
        F: Future<Output = Result<T, ServiceError>> + Send + 'static,
    {
        if token.trim().is_empty() {
            return Err(ServiceError::Validation("idempotency key is required".into()));
        }

        let flight = match self.idempotency.begin(token).await? {
            Begin::Fresh(flight) => flight,
            Begin::InProgress => return Err(ServiceError::DuplicateInProgress(token.to_string())),
            Begin::Completed(body) => return Ok(Outcome::Replayed(body)),
        };

        let task = tokio::spawn(settle(flight, op).in_current_span());
        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(ServiceError::Persistence(format!("request task cancelled: {e}"))),
        }
    }
}

/// Drives `op` to the end and records the result against `flight`.
async fn settle<T, F>(flight: InFlight, op: F) -> Result<Outcome, ServiceError>
where
    T: Serialize,
    F: Future<Output = Result<T, ServiceError>>,
{
    let body = match op.await.and_then(|value| Ok(serde_json::to_string(&value)?)) {
        Ok(body) => body,
        Err(e) => {
            if let Err(abandon) = flight.abandon().await {
                warn!(error = %abandon, "Abandon failed; token blocked until expiry");
            }
            return Err(e);
        }
    };

    flight.complete(&body).await?;
    info!("Response cached");
    Ok(Outcome::Created(body))
}
