//! # Storage
//!
//! Pool construction, schema creation and demo data for the relational store.

use crate::inventory::{InventoryLedger, LedgerError};
use crate::model::{ProductCreate, ProductId};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// How long a connection waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        price TEXT NOT NULL,
        stock INTEGER NOT NULL CHECK (stock >= 0),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_name TEXT NOT NULL,
        total_amount TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS order_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id INTEGER NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
        product_id INTEGER NOT NULL REFERENCES products (id),
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        subtotal TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_order_items_order_id ON order_items (order_id)",
];

/// Opens a SQLite pool with foreign keys enforced.
///
/// Every connection to `sqlite::memory:` is a separate database, so in-memory
/// URLs get exactly one connection that is never recycled. File databases run
/// in WAL mode and wait up to [`BUSY_TIMEOUT`] for a competing writer.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = if is_in_memory(url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options.journal_mode(SqliteJournalMode::Wal))
            .await?
    };

    info!(url, "Database connected");
    Ok(pool)
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Opens a transaction that holds the database write lock from its first
/// statement.
///
/// A deferred `BEGIN` that reads before writing cannot upgrade its lock while
/// another connection writes, and SQLite fails it at once instead of waiting.
/// `BEGIN IMMEDIATE` queues on the busy timeout instead.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, sqlx::Error> {
    pool.begin_with("BEGIN IMMEDIATE").await
}

/// Creates the tables if they do not exist yet.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(*statement).execute(pool).await?;
    }
    info!(statements = SCHEMA.len(), "Schema ready");
    Ok(())
}

/// Inserts the demo catalogue when `products` is empty. Returns the ids created.
pub async fn seed_demo_products(pool: &SqlitePool) -> Result<Vec<ProductId>, LedgerError> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        info!(existing, "Products present; skipping seed");
        return Ok(Vec::new());
    }

    let ledger = InventoryLedger::new(pool.clone());
    let mut ids = Vec::new();
    for (name, price, stock) in [
        ("Widget A", Decimal::new(1050, 2), 100),
        ("Widget B", Decimal::new(2000, 2), 50),
        ("Widget C", Decimal::new(1575, 2), 200),
    ] {
        let product = ledger
            .create_product(ProductCreate::new(name, price, stock))
            .await?;
        ids.push(product.id);
    }

    info!(count = ids.len(), "Seeded demo products");
    Ok(ids)
}
