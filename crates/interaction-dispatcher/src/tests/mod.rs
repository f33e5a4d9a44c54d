//! Integration tests for the dispatcher, driven through the axum router.
//!
//! - `harness.rs`   - signing helpers, recording transport and alert sink, scripted handlers
//! - `auth.rs`      - signature gate
//! - `ping.rs`      - liveness probes
//! - `ack.rs`       - deferred acknowledgment ordering
//! - `reporting.rs` - reply and alert routing for handler outcomes
//! - `config.rs`    - runtime configuration checks

mod ack;
