//! Client traits for the three RPC surfaces.
//!
//! The broker talks to storage nodes and consumers, and the edge processes
//! (producers, consumers) talk to the broker, through these traits. The
//! production implementations in `cyberday-transport` speak HTTP/JSON with
//! per-call deadlines; the test implementations in `cyberday-testing` are
//! in-memory and scripted.
//!
//! # Dyn Compatibility
//!
//! The traits use explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` so they can be held as trait objects (`Arc<dyn
//! StorageNodeClient>`) in the broker's node descriptors and consumer
//! registry, and moved into spawned fan-out tasks.

use crate::offer::Offer;
use crate::wire::{DeliverAck, HistoryReply, OfferAck, ReconcileAck, RegisterAck, StoreAck};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Transport-level failures of an outbound call.
///
/// These mean the exchange itself failed (connection refused, deadline
/// elapsed, malformed body). Data-level refusals (`ok = false` replies) are
/// not errors at this layer.
#[derive(Error, Debug, Clone)]
pub enum ClientError {
    /// The call did not complete within its deadline.
    #[error("deadline elapsed after {0} ms")]
    DeadlineElapsed(u64),

    /// Connection or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The peer answered with a body this client could not decode.
    #[error("invalid reply: {0}")]
    InvalidReply(String),
}

/// Convenience alias for the boxed futures the client traits return.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ClientError>> + Send + 'a>>;

/// Handle to one storage node.
///
/// One instance per node, held for the broker's lifetime (and by peer nodes
/// for gossip). All calls attach their own deadline.
pub trait StorageNodeClient: Send + Sync {
    /// The node id this client points at.
    fn node_id(&self) -> &str;

    /// Persist one offer on the node.
    ///
    /// A node in its simulated-down state answers `ok = false` rather than
    /// failing the exchange.
    fn store(&self, offer: &Offer) -> ClientFuture<'_, StoreAck>;

    /// Read every offer with `timestamp >= since_ts` (0 = everything).
    fn read_all(&self, caller_id: &str, since_ts: i64) -> ClientFuture<'_, HistoryReply>;

    /// Push a full snapshot for anti-entropy merge.
    fn reconcile(&self, source_node: &str, offers: &[Offer]) -> ClientFuture<'_, ReconcileAck>;
}

/// Handle to one registered consumer.
pub trait ConsumerClient: Send + Sync {
    /// Push one offer to the consumer.
    ///
    /// A disconnected consumer answers `ok = false`; the broker treats that
    /// the same as a transport failure and marks the registration inactive.
    fn deliver(&self, offer: &Offer) -> ClientFuture<'_, DeliverAck>;
}

/// Handle to the broker, used by producers and consumers.
pub trait BrokerClient: Send + Sync {
    /// Submit one offer for validation, replication and fan-out.
    fn submit_offer(&self, offer: &Offer) -> ClientFuture<'_, OfferAck>;

    /// Register (or re-activate) a consumer subscription.
    fn register_consumer(
        &self,
        consumer_id: &str,
        categories: &[String],
        stores: &[String],
        max_price: u32,
        address: &str,
    ) -> ClientFuture<'_, RegisterAck>;

    /// Fetch the quorum-merged history, filtered for the given consumer.
    fn fetch_history(&self, consumer_id: &str) -> ClientFuture<'_, HistoryReply>;
}
