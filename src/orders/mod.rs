//! # Orders
//!
//! [`OrderOrchestrator`] runs order creation end to end; [`OrderRepository`]
//! owns the SQL for `orders` and `order_items`.

mod orchestrator;
mod repository;

pub use orchestrator::OrderOrchestrator;
pub use repository::OrderRepository;
