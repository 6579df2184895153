//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing_subscriber` formatter filtered
//! by `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! - **Store**: actor start and shutdown at `info`, every verb at `debug`/`trace`
//! - **Idempotency**: fresh, in-progress, replayed, completed and abandoned tokens
//! - **Locks**: acquisition results and releases, with the `lock` field
//! - **Orders**: validation payload at `debug`, the created `order_id` at `info`,
//!   rollbacks at `warn`
//!
//! ## Usage Examples
//!
//! ```bash
//! # State transitions only
//! RUST_LOG=info cargo run
//!
//! # Payloads and every store verb
//! RUST_LOG=debug cargo run
//!
//! # Only the lock manager
//! RUST_LOG=order_desk::lock=debug cargo run
//! ```
//!
//! Client-facing methods carry `#[instrument]` spans, so with the compact
//! format a replayed order shows up as:
//!
//! ```text
//! INFO create_order:begin: Token completed; replaying token="req-1"
//! ```

/// Installs the global subscriber. Call once, at the start of `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
