//! # Cyberday Storage Node
//!
//! One member of the three-node replicated offer store. Each node owns a
//! local offer map keyed by `offer_id`, persists it as a single JSON
//! document, serves quorum reads, and converges with its peers through
//! periodic anti-entropy pushes.
//!
//! A node can simulate an outage: while down it refuses `Store` and
//! `Reconcile` (but keeps serving `ReadAll`), and on recovery it pulls the
//! full set from the first reachable peer before resuming normal gossip.

pub mod config;
pub mod gossip;
pub mod http;
pub mod outage;
pub mod store;

pub use config::NodeConfig;
pub use store::NodeStore;
