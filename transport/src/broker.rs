//! HTTP client for the broker, used by producers and consumers.

use crate::{post_json, Deadlines};
use cyberday_core::client::ClientFuture;
use cyberday_core::wire::{
    FetchHistoryRequest, HistoryReply, OfferAck, RegisterAck, RegisterConsumerRequest,
};
use cyberday_core::{BrokerClient, Offer};

/// Talks to the central broker over HTTP.
#[derive(Clone)]
pub struct HttpBrokerClient {
    base_url: String,
    client: reqwest::Client,
    deadlines: Deadlines,
}

impl HttpBrokerClient {
    /// Create a client for the broker at `addr` (`host:port`).
    #[must_use]
    pub fn new(addr: &str, deadlines: Deadlines) -> Self {
        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            deadlines,
        }
    }
}

impl BrokerClient for HttpBrokerClient {
    fn submit_offer(&self, offer: &Offer) -> ClientFuture<'_, OfferAck> {
        let offer = offer.clone();
        Box::pin(async move {
            let url = format!("{}/v1/offers", self.base_url);
            post_json(&self.client, &url, &offer, self.deadlines.submit).await
        })
    }

    fn register_consumer(
        &self,
        consumer_id: &str,
        categories: &[String],
        stores: &[String],
        max_price: u32,
        address: &str,
    ) -> ClientFuture<'_, RegisterAck> {
        let request = RegisterConsumerRequest {
            consumer_id: consumer_id.to_string(),
            categories: categories.to_vec(),
            stores: stores.to_vec(),
            max_price,
            address: address.to_string(),
        };
        Box::pin(async move {
            let url = format!("{}/v1/consumers", self.base_url);
            post_json(&self.client, &url, &request, self.deadlines.register).await
        })
    }

    fn fetch_history(&self, consumer_id: &str) -> ClientFuture<'_, HistoryReply> {
        let request = FetchHistoryRequest {
            consumer_id: consumer_id.to_string(),
        };
        Box::pin(async move {
            let url = format!("{}/v1/history", self.base_url);
            post_json(&self.client, &url, &request, self.deadlines.history).await
        })
    }
}
