//! # Cyberday Broker
//!
//! The central dispatcher of the Cyberday system: validates incoming offers,
//! suppresses duplicates, replicates accepted offers to the storage cluster
//! under W-of-N quorum, and pushes them to filter-matching consumers.
//!
//! # Architecture
//!
//! ```text
//!               SubmitOffer
//! Producer ───────▶ Broker ───▶ validate ─▶ dedupe ─▶ quorum write (W=2)
//!                     │                                    │
//!                     │                                    ▼
//!                     │                             mark processed
//!                     │                                    │
//!                     └──── DeliverOffer ◀─── fan-out ◀────┘
//!                           (per matching consumer, best effort)
//! ```
//!
//! The broker keeps five independently locked structures: the producer
//! roster, the consumer registry, the node descriptors, the processed-id
//! set and the run statistics. Locks are never held across an outbound
//! call: fan-out snapshots what it needs, releases, then performs I/O.
//!
//! All broker state is in-memory; a restart resets the idempotence set
//! (at-most-once per broker lifetime).

pub mod cluster;
pub mod config;
pub mod dispatcher;
pub mod history;
pub mod http;
pub mod registry;
pub mod report;

pub use cluster::{Cluster, NodeDescriptor};
pub use config::BrokerConfig;
pub use dispatcher::{Broker, ConsumerConnector};
pub use registry::{ConsumerRegistration, ConsumerRegistry, ProducerRoster};
