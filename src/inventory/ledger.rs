use super::LedgerError;
use crate::model::{Product, ProductCreate, ProductId};
use crate::storage;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, instrument};

const PRODUCT_COLUMNS: &str = "id, name, price, stock, created_at, updated_at";

/// Outcome of a successful conditional decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: ProductId,
    /// Unit price read in the same transaction as the decrement.
    pub price: Decimal,
    pub remaining: i64,
}

#[derive(Clone)]
pub struct InventoryLedger {
    pool: SqlitePool,
}

impl InventoryLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self, params), fields(name = %params.name))]
    pub async fn create_product(&self, params: ProductCreate) -> Result<Product, LedgerError> {
        if params.name.trim().is_empty() {
            return Err(LedgerError::Invalid("product name is required".into()));
        }
        if params.price.is_sign_negative() {
            return Err(LedgerError::Invalid(format!("negative price {}", params.price)));
        }
        if params.stock < 0 {
            return Err(LedgerError::Invalid(format!("negative stock {}", params.stock)));
        }

        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO products (name, price, stock, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&params.name)
        .bind(params.price.to_string())
        .bind(params.stock)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        let id = ProductId(id);
        info!(product_id = %id, stock = params.stock, "Created");
        self.get_product(id)
            .await?
            .ok_or(LedgerError::NotFound(id))
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, LedgerError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(product_from_row).transpose()?)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, LedgerError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let products = rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    /// Decrements `quantity` units of `id` inside the caller's transaction.
    ///
    /// The row update only applies while `stock >= quantity`; a zero row count
    /// is the authoritative "insufficient stock" answer. The existence read runs
    /// on the same connection first so a missing product is reported as
    /// [`LedgerError::NotFound`].
    #[instrument(skip(self, conn), fields(product_id = %id))]
    pub async fn check_and_reserve(
        &self,
        conn: &mut SqliteConnection,
        id: ProductId,
        quantity: i64,
    ) -> Result<Reservation, LedgerError> {
        if quantity < 1 {
            return Err(LedgerError::Invalid(format!("quantity must be at least 1, got {quantity}")));
        }

        let row = sqlx::query("SELECT price, stock FROM products WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(LedgerError::NotFound(id))?;
        let price = decode_decimal(&row, "price")?;
        let available: i64 = row.try_get("stock")?;

        let updated = sqlx::query(
            "UPDATE products SET stock = stock - ?, updated_at = ? WHERE id = ? AND stock >= ?",
        )
        .bind(quantity)
        .bind(Utc::now())
        .bind(id.0)
        .bind(quantity)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if updated == 0 {
            debug!(requested = quantity, available, "Decrement rejected");
            return Err(LedgerError::InsufficientStock {
                product_id: id,
                requested: quantity,
                available,
            });
        }

        let remaining = available - quantity;
        debug!(requested = quantity, remaining, "Reserved");
        Ok(Reservation {
            product_id: id,
            price,
            remaining,
        })
    }

    /// Replaces the stock count of `id`. Callers hold the product's lease.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn set_stock(&self, id: ProductId, new_stock: i64) -> Result<(), LedgerError> {
        if new_stock < 0 {
            return Err(LedgerError::Invalid(format!("negative stock {new_stock}")));
        }

        let mut tx = storage::begin_write(&self.pool).await?;
        let updated = sqlx::query("UPDATE products SET stock = ?, updated_at = ? WHERE id = ?")
            .bind(new_stock)
            .bind(Utc::now())
            .bind(id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            tx.rollback().await?;
            return Err(LedgerError::NotFound(id));
        }
        tx.commit().await?;

        info!(stock = new_stock, "Stock set");
        Ok(())
    }
}

fn product_from_row(row: &SqliteRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId(row.try_get("id")?),
        name: row.try_get("name")?,
        price: decode_decimal(row, "price")?,
        stock: row.try_get("stock")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Money columns are TEXT holding the decimal's canonical string.
pub(crate) fn decode_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ledger() -> InventoryLedger {
        let pool = storage::connect("sqlite::memory:", 1).await.unwrap();
        storage::migrate(&pool).await.unwrap();
        InventoryLedger::new(pool)
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_read_product() {
        let ledger = ledger().await;

        let created = ledger
            .create_product(ProductCreate::new("Widget", dec("10.50"), 100))
            .await
            .unwrap();
        assert_eq!(created.price, dec("10.50"));
        assert_eq!(created.stock, 100);

        let fetched = ledger.get_product(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(ledger.get_product(ProductId(999)).await.unwrap().is_none());
        assert_eq!(ledger.list_products().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_product_rejects_bad_input() {
        let ledger = ledger().await;

        for params in [
            ProductCreate::new(" ", dec("1"), 1),
            ProductCreate::new("A", dec("-1"), 1),
            ProductCreate::new("A", dec("1"), -1),
        ] {
            assert!(matches!(
                ledger.create_product(params).await,
                Err(LedgerError::Invalid(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_check_and_reserve_conditional_decrement() {
        let ledger = ledger().await;
        let product = ledger
            .create_product(ProductCreate::new("Gadget", dec("2.25"), 5))
            .await
            .unwrap();

        let mut tx = ledger.pool.begin().await.unwrap();
        let reservation = ledger
            .check_and_reserve(&mut tx, product.id, 3)
            .await
            .unwrap();
        assert_eq!(reservation.remaining, 2);
        assert_eq!(reservation.price, dec("2.25"));

        let err = ledger
            .check_and_reserve(&mut tx, product.id, 3)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientStock { requested: 3, available: 2, .. }
        ));

        let missing = ledger
            .check_and_reserve(&mut tx, ProductId(404), 1)
            .await
            .unwrap_err();
        assert!(matches!(missing, LedgerError::NotFound(ProductId(404))));
        tx.commit().await.unwrap();

        let stock = ledger.get_product(product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 2);
    }

    #[tokio::test]
    async fn test_rolled_back_reservation_leaves_stock() {
        let ledger = ledger().await;
        let product = ledger
            .create_product(ProductCreate::new("Gizmo", dec("1"), 10))
            .await
            .unwrap();

        let mut tx = ledger.pool.begin().await.unwrap();
        ledger.check_and_reserve(&mut tx, product.id, 4).await.unwrap();
        tx.rollback().await.unwrap();

        let stock = ledger.get_product(product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 10);
    }

    #[tokio::test]
    async fn test_set_stock() {
        let ledger = ledger().await;
        let product = ledger
            .create_product(ProductCreate::new("Thing", dec("3"), 1))
            .await
            .unwrap();

        ledger.set_stock(product.id, 0).await.unwrap();
        assert_eq!(ledger.get_product(product.id).await.unwrap().unwrap().stock, 0);

        assert!(matches!(
            ledger.set_stock(product.id, -1).await,
            Err(LedgerError::Invalid(_))
        ));
        assert!(matches!(
            ledger.set_stock(ProductId(77), 5).await,
            Err(LedgerError::NotFound(ProductId(77)))
        ));
    }
}
