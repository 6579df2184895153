//! Plain data structures shared by the ledger, the orchestrator and the
//! `OrderDesk` surface. Everything here is `Serialize + Deserialize` so it can be
//! cached verbatim as an idempotent response body.

pub mod idempotency;
pub mod order;
pub mod product;

pub use idempotency::*;
pub use order::*;
pub use product::*;
