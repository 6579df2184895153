use crate::inventory::decode_decimal;
use crate::model::{Order, OrderId, OrderItem, ProductId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Row access for `orders` and `order_items`.
#[derive(Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert_order(
        &self,
        conn: &mut SqliteConnection,
        customer_name: &str,
        total_amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<OrderId, sqlx::Error> {
        let id = sqlx::query(
            "INSERT INTO orders (customer_name, total_amount, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(customer_name)
        .bind(total_amount.to_string())
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();
        Ok(OrderId(id))
    }

    pub async fn insert_item(
        &self,
        conn: &mut SqliteConnection,
        order_id: OrderId,
        product_id: ProductId,
        quantity: i64,
        subtotal: Decimal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, subtotal) VALUES (?, ?, ?, ?)",
        )
        .bind(order_id.0)
        .bind(product_id.0)
        .bind(quantity)
        .bind(subtotal.to_string())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// The order with its items in insertion order, or `None`.
    pub async fn get_with_items(&self, id: OrderId) -> Result<Option<Order>, sqlx::Error> {
        let Some(row) = sqlx::query(
            "SELECT id, customer_name, total_amount, created_at, updated_at FROM orders WHERE id = ?",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query(
            "SELECT id, order_id, product_id, quantity, subtotal FROM order_items WHERE order_id = ? ORDER BY id",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(|item| {
            Ok(OrderItem {
                id: item.try_get("id")?,
                order_id: OrderId(item.try_get("order_id")?),
                product_id: ProductId(item.try_get("product_id")?),
                quantity: item.try_get("quantity")?,
                subtotal: decode_decimal(item, "subtotal")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(Some(Order {
            id: OrderId(row.try_get("id")?),
            customer_name: row.try_get("customer_name")?,
            total_amount: decode_decimal(&row, "total_amount")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            items,
        }))
    }
}
