//! HTTP client for one storage node.

use crate::{post_json, Deadlines};
use cyberday_core::client::ClientFuture;
use cyberday_core::wire::{HistoryReply, ReadAllRequest, ReconcileAck, ReconcileRequest, StoreAck};
use cyberday_core::{Offer, StorageNodeClient};

/// Talks to a single storage node over HTTP.
///
/// The broker holds one of these per node for its whole lifetime; nodes hold
/// one per peer for gossip.
#[derive(Clone)]
pub struct HttpStorageNodeClient {
    node_id: String,
    base_url: String,
    client: reqwest::Client,
    deadlines: Deadlines,
}

impl HttpStorageNodeClient {
    /// Create a client for the node at `addr` (`host:port`).
    #[must_use]
    pub fn new(node_id: impl Into<String>, addr: &str, deadlines: Deadlines) -> Self {
        Self {
            node_id: node_id.into(),
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            deadlines,
        }
    }
}

impl StorageNodeClient for HttpStorageNodeClient {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    fn store(&self, offer: &Offer) -> ClientFuture<'_, StoreAck> {
        let offer = offer.clone();
        Box::pin(async move {
            let url = format!("{}/v1/store", self.base_url);
            post_json(&self.client, &url, &offer, self.deadlines.store).await
        })
    }

    fn read_all(&self, caller_id: &str, since_ts: i64) -> ClientFuture<'_, HistoryReply> {
        let request = ReadAllRequest {
            node_id: caller_id.to_string(),
            since_ts,
        };
        Box::pin(async move {
            let url = format!("{}/v1/read_all", self.base_url);
            post_json(&self.client, &url, &request, self.deadlines.read_all).await
        })
    }

    fn reconcile(&self, source_node: &str, offers: &[Offer]) -> ClientFuture<'_, ReconcileAck> {
        let request = ReconcileRequest {
            source_node: source_node.to_string(),
            offers: offers.to_vec(),
        };
        Box::pin(async move {
            let url = format!("{}/v1/reconcile", self.base_url);
            post_json(&self.client, &url, &request, self.deadlines.reconcile).await
        })
    }
}
