//! # Inventory Ledger
//!
//! Per-product stock kept in the relational store. Decrements are conditional
//! row updates executed inside the caller's transaction, so stock can never be
//! driven below zero by committed work. Direct stock replacement goes through
//! [`StockAdjuster`], which holds the product's lease around the write.

mod adjuster;
mod error;
mod ledger;

pub use adjuster::StockAdjuster;
pub use error::LedgerError;
pub use ledger::{InventoryLedger, Reservation};
pub(crate) use ledger::decode_decimal;
