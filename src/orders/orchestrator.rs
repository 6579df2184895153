use super::OrderRepository;
use crate::error::ServiceError;
use crate::inventory::InventoryLedger;
use crate::lock::LockManager;
use crate::model::{Order, OrderCreate, OrderId, ProductId};
use crate::storage;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// Creates orders as one lock-protected, transactional unit.
///
/// The pipeline is validate → advisory stock check → lock every distinct
/// product (ascending id) → one transaction that decrements stock and inserts
/// the order and its items → commit → release leases → re-read. Leases are
/// released on every path once they have been taken; the transaction is rolled
/// back on any failure inside it.
#[derive(Clone)]
pub struct OrderOrchestrator {
    pool: SqlitePool,
    ledger: InventoryLedger,
    orders: OrderRepository,
    locks: LockManager,
}

impl OrderOrchestrator {
    pub fn new(
        pool: SqlitePool,
        ledger: InventoryLedger,
        orders: OrderRepository,
        locks: LockManager,
    ) -> Self {
        Self {
            pool,
            ledger,
            orders,
            locks,
        }
    }

    #[instrument(skip(self, params), fields(customer = %params.customer_name, items = params.items.len()))]
    pub async fn create_order(&self, params: &OrderCreate) -> Result<Order, ServiceError> {
        debug!(?params, "create_order called");

        let demand = validate(params)?;
        self.check_availability(&demand).await?;

        let leases = self.locks.lock_products(demand.keys().copied()).await?;
        let persisted = self.persist(params).await;
        leases.release().await;
        let order_id = persisted?;

        info!(%order_id, "Order created");
        self.orders
            .get_with_items(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(order_id.to_string()))
    }

    /// Fast fail before locking. Not authoritative: the conditional decrement is.
    async fn check_availability(&self, demand: &BTreeMap<ProductId, i64>) -> Result<(), ServiceError> {
        for (&product_id, &requested) in demand {
            let product = self
                .ledger
                .get_product(product_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(product_id.to_string()))?;
            if product.stock < requested {
                debug!(%product_id, requested, available = product.stock, "Advisory check failed");
                return Err(ServiceError::InsufficientStock {
                    product_id,
                    requested,
                    available: product.stock,
                });
            }
        }
        Ok(())
    }

    async fn persist(&self, params: &OrderCreate) -> Result<OrderId, ServiceError> {
        let mut tx = storage::begin_write(&self.pool).await?;
        match self.write(&mut tx, params).await {
            Ok(order_id) => {
                tx.commit().await?;
                Ok(order_id)
            }
            Err(e) => {
                warn!(error = %e, "Rolling back order");
                if let Err(rollback) = tx.rollback().await {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn write(&self, conn: &mut SqliteConnection, params: &OrderCreate) -> Result<OrderId, ServiceError> {
        let mut lines = Vec::with_capacity(params.items.len());
        let mut total = Decimal::ZERO;

        for item in &params.items {
            let reservation = self
                .ledger
                .check_and_reserve(conn, item.product_id, item.quantity)
                .await?;
            let subtotal = reservation
                .price
                .checked_mul(Decimal::from(item.quantity))
                .ok_or_else(|| ServiceError::Validation(format!("subtotal overflow for {}", item.product_id)))?;
            total = total
                .checked_add(subtotal)
                .ok_or_else(|| ServiceError::Validation("order total overflow".into()))?;
            lines.push((item, subtotal));
        }

        let order_id = self
            .orders
            .insert_order(conn, params.customer_name.trim(), total, Utc::now())
            .await?;
        for (item, subtotal) in lines {
            self.orders
                .insert_item(conn, order_id, item.product_id, item.quantity, subtotal)
                .await?;
        }

        debug!(%order_id, %total, "Order rows written");
        Ok(order_id)
    }
}

/// Checks the request shape and sums quantities per distinct product.
fn validate(params: &OrderCreate) -> Result<BTreeMap<ProductId, i64>, ServiceError> {
    if params.customer_name.trim().is_empty() {
        return Err(ServiceError::Validation("customer name is required".into()));
    }
    if params.items.is_empty() {
        return Err(ServiceError::Validation("order must contain at least one item".into()));
    }

    let mut demand = BTreeMap::new();
    for item in &params.items {
        if item.product_id.0 <= 0 {
            return Err(ServiceError::Validation(format!("invalid product id {}", item.product_id.0)));
        }
        if item.quantity < 1 {
            return Err(ServiceError::Validation(format!(
                "quantity for {} must be at least 1",
                item.product_id
            )));
        }
        let entry = demand.entry(item.product_id).or_insert(0i64);
        *entry = entry
            .checked_add(item.quantity)
            .ok_or_else(|| ServiceError::Validation(format!("quantity overflow for {}", item.product_id)))?;
    }
    Ok(demand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OrderItemCreate;

    #[test]
    fn test_validate_collapses_duplicate_products() {
        let params = OrderCreate::new(
            "Ada",
            vec![
                OrderItemCreate::new(2, 1),
                OrderItemCreate::new(1, 4),
                OrderItemCreate::new(2, 3),
            ],
        );
        let demand = validate(&params).unwrap();
        assert_eq!(
            demand.into_iter().collect::<Vec<_>>(),
            vec![(ProductId(1), 4), (ProductId(2), 4)]
        );
    }

    #[test]
    fn test_validate_rejects_bad_requests() {
        let cases = [
            OrderCreate::new("  ", vec![OrderItemCreate::new(1, 1)]),
            OrderCreate::new("Ada", vec![]),
            OrderCreate::new("Ada", vec![OrderItemCreate::new(1, 0)]),
            OrderCreate::new("Ada", vec![OrderItemCreate::new(0, 1)]),
            OrderCreate::new(
                "Ada",
                vec![OrderItemCreate::new(1, i64::MAX), OrderItemCreate::new(1, 1)],
            ),
        ];
        for params in cases {
            assert!(
                matches!(validate(&params), Err(ServiceError::Validation(_))),
                "accepted {params:?}"
            );
        }
    }
}
