//! Demo: place an order, replay it with the same token, then restock.

use order_desk::lifecycle::setup_tracing;
use order_desk::model::{Order, OrderCreate, OrderItemCreate, StockAck};
use order_desk::{storage, OrderSystem, ServiceConfig};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = ServiceConfig::from_env().map_err(|e| e.to_string())?;
    info!(?config, "Starting order desk");

    let system = OrderSystem::start(&config).await.map_err(|e| e.to_string())?;
    let ids = storage::seed_demo_products(system.pool())
        .await
        .map_err(|e| e.to_string())?;
    let (first, second) = match ids.as_slice() {
        [a, b, ..] => (*a, *b),
        _ => {
            let products = system.desk.list_products().await.map_err(|e| e.to_string())?;
            match products.as_slice() {
                [a, b, ..] => (a.id, b.id),
                _ => return Err("need at least two products".into()),
            }
        }
    };

    let params = OrderCreate::new(
        "Alice",
        vec![
            OrderItemCreate { product_id: first, quantity: 2 },
            OrderItemCreate { product_id: second, quantity: 1 },
        ],
    );

    let span = tracing::info_span!("order_processing");
    let created = async {
        system
            .desk
            .create_order("demo-order-1", params.clone())
            .await
            .map_err(|e| e.to_string())
    }
    .instrument(span.clone())
    .await?;
    let order: Order = created.decode().map_err(|e| e.to_string())?;
    info!(order_id = %order.id, total = %order.total_amount, "Order placed");

    // Same token again: served from the idempotency record, no second decrement
    let replayed = system
        .desk
        .create_order("demo-order-1", params)
        .instrument(span)
        .await
        .map_err(|e| e.to_string())?;
    info!(replay = replayed.is_replay(), identical = replayed.body() == created.body(), "Order retried");

    let restock = system
        .desk
        .update_product_stock("demo-restock-1", first, 500)
        .await
        .map_err(|e| e.to_string())?;
    let ack: StockAck = restock.decode().map_err(|e| e.to_string())?;
    info!(product_id = %ack.product_id, stock = ack.stock, "Restocked");

    for product in system.desk.list_products().await.map_err(|e| e.to_string())? {
        info!(product_id = %product.id, name = %product.name, stock = product.stock, "Inventory");
    }

    if let Err(e) = system.shutdown().await {
        error!(error = %e, "Shutdown failed");
        return Err(e);
    }
    Ok(())
}
