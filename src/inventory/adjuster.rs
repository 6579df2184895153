use super::InventoryLedger;
use crate::error::ServiceError;
use crate::lock::LockManager;
use crate::model::{ProductId, StockAck};
use tracing::{info, instrument};

/// Direct stock replacement serialized with order creation through the
/// product's lease.
#[derive(Clone)]
pub struct StockAdjuster {
    ledger: InventoryLedger,
    locks: LockManager,
}

impl StockAdjuster {
    pub fn new(ledger: InventoryLedger, locks: LockManager) -> Self {
        Self { ledger, locks }
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn set_stock(&self, id: ProductId, new_stock: i64) -> Result<StockAck, ServiceError> {
        let leases = self.locks.lock_products([id]).await?;
        let result = self.ledger.set_stock(id, new_stock).await;
        leases.release().await;
        result?;

        info!(stock = new_stock, "Stock updated");
        Ok(StockAck {
            product_id: id,
            stock: new_stock,
        })
    }
}
