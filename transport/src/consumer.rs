//! HTTP client for one registered consumer.

use crate::{post_json, Deadlines};
use cyberday_core::client::ClientFuture;
use cyberday_core::wire::DeliverAck;
use cyberday_core::{ConsumerClient, Offer};

/// Pushes offers to a single consumer over HTTP.
#[derive(Clone)]
pub struct HttpConsumerClient {
    base_url: String,
    client: reqwest::Client,
    deadlines: Deadlines,
}

impl HttpConsumerClient {
    /// Create a client for the consumer listening at `addr` (`host:port`).
    #[must_use]
    pub fn new(addr: &str, deadlines: Deadlines) -> Self {
        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            deadlines,
        }
    }
}

impl ConsumerClient for HttpConsumerClient {
    fn deliver(&self, offer: &Offer) -> ClientFuture<'_, DeliverAck> {
        let offer = offer.clone();
        Box::pin(async move {
            let url = format!("{}/v1/deliver", self.base_url);
            post_json(&self.client, &url, &offer, self.deadlines.deliver).await
        })
    }
}
