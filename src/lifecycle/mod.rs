//! System wiring and process-wide setup.

mod system;
pub mod tracing;

pub use self::tracing::setup_tracing;
pub use system::OrderSystem;
