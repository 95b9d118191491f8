//! # Cyberday Runtime
//!
//! Concurrency primitives shared by the Cyberday services:
//!
//! - [`quorum`]: W-of-N fan-out collection with an aggregate deadline and
//!   fire-and-forget stragglers
//! - [`retry`]: bounded retry loops for service registration and connection
//!   establishment
//!
//! Both are deliberately independent of the wire format: they operate on
//! plain futures, so the broker drives real HTTP calls through them in
//! production and in-memory mocks in tests.

pub mod quorum;
pub mod retry;

pub use quorum::{collect_write_quorum, QuorumOutcome};
pub use retry::{retry_with_policy, RetryPolicy};
