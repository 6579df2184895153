#![allow(dead_code)]

use order_desk::model::{Product, ProductCreate, ProductId};
use order_desk::{OrderSystem, ServiceConfig};
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::TempDir;

/// A fresh system on an in-memory database.
pub async fn test_system() -> OrderSystem {
    OrderSystem::start(&ServiceConfig::default())
        .await
        .expect("Failed to start system")
}

/// A fresh system on a database file with a multi-connection pool, so
/// transactions really overlap. Keep the directory alive for the test.
pub async fn file_system(max_connections: u32) -> (OrderSystem, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config = ServiceConfig {
        database_url: format!("sqlite://{}", dir.path().join("orders.db").display()),
        max_connections,
        ..ServiceConfig::default()
    };
    let system = OrderSystem::start(&config)
        .await
        .expect("Failed to start system");
    (system, dir)
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("bad decimal literal")
}

pub async fn add_product(system: &OrderSystem, name: &str, price: &str, stock: i64) -> Product {
    system
        .ledger
        .create_product(ProductCreate::new(name, dec(price), stock))
        .await
        .expect("Failed to create product")
}

pub async fn stock_of(system: &OrderSystem, id: ProductId) -> i64 {
    system
        .ledger
        .get_product(id)
        .await
        .expect("Failed to read product")
        .expect("Product not found")
        .stock
}

pub async fn count(system: &OrderSystem, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(system.pool())
        .await
        .expect("Failed to count rows")
}
