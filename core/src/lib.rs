//! # Cyberday Core
//!
//! Core domain types and client traits for the Cyberday offer broker.
//!
//! This crate defines:
//! - [`offer::Offer`]: the single replicated entity and its validation rules
//! - [`filter::SubscriptionFilter`]: typed consumer subscription constraints
//! - [`wire`]: request/reply bodies exchanged between broker, storage nodes,
//!   producers and consumers
//! - [`client`]: the async client traits implemented by the HTTP transport
//!   (production) and by the in-memory mocks (tests)
//!
//! # Architecture
//!
//! ```text
//! Producer ──▶ Broker ──▶ Storage Nodes (N=3, W=2, R=2)
//!                │
//!                └──▶ Consumers (filter-matched push)
//! ```
//!
//! The crate is deliberately free of I/O: everything here is data and
//! contracts. Network implementations live in `cyberday-transport`, mocks in
//! `cyberday-testing`.

pub mod client;
pub mod filter;
pub mod offer;
pub mod wire;

pub use client::{BrokerClient, ClientError, ConsumerClient, StorageNodeClient};
pub use filter::{FieldFilter, SubscriptionFilter};
pub use offer::{InvalidOffer, Offer, VALID_CATEGORIES};
