use super::ProductId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order_{}", self.0)
    }
}

/// A committed order with its line items.
///
/// Orders are immutable once created; `total_amount` is the sum of the item
/// subtotals computed inside the creating transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// One order line. `subtotal` is price × quantity at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub subtotal: Decimal,
}

/// Parameters for creating an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub customer_name: String,
    pub items: Vec<OrderItemCreate>,
}

impl OrderCreate {
    pub fn new(customer_name: impl Into<String>, items: Vec<OrderItemCreate>) -> Self {
        Self {
            customer_name: customer_name.into(),
            items,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemCreate {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl OrderItemCreate {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        Self {
            product_id: ProductId(product_id),
            quantity,
        }
    }
}
