//! The ingest pipeline: validate, dedupe, replicate, fan out.

use crate::cluster::{Cluster, WRITE_QUORUM};
use crate::registry::{ConsumerRegistry, ProducerRoster};
use cyberday_core::wire::{OfferAck, RegisterAck, RegisterConsumerRequest};
use cyberday_core::Offer;
use cyberday_runtime::quorum::{collect_write_quorum, QuorumOutcome};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use crate::registry::ConsumerConnector;

/// Reply message for a duplicate submission.
pub const ALREADY_PROCESSED: &str = "already processed";
/// Reply message when fewer than W nodes acknowledged.
pub const QUORUM_UNREACHED: &str = "quorum unreached";

/// The central dispatcher.
///
/// One instance per broker process, shared across all request handlers
/// behind an `Arc`. See the crate docs for the locking discipline.
pub struct Broker {
    pub(crate) roster: ProducerRoster,
    pub(crate) consumers: ConsumerRegistry,
    pub(crate) cluster: Cluster,
    processed: Mutex<HashSet<String>>,
    write_deadline: Duration,
}

impl Broker {
    /// Build a broker over the declared cluster and consumer connector.
    #[must_use]
    pub fn new(cluster: Cluster, connect: ConsumerConnector) -> Self {
        Self {
            roster: ProducerRoster::new(),
            consumers: ConsumerRegistry::new(connect),
            cluster,
            processed: Mutex::new(HashSet::new()),
            write_deadline: Duration::from_secs(2),
        }
    }

    /// Override the aggregate quorum-write deadline (tests shorten it).
    #[must_use]
    pub const fn with_write_deadline(mut self, deadline: Duration) -> Self {
        self.write_deadline = deadline;
        self
    }

    /// Total distinct offers processed this run.
    #[must_use]
    pub fn processed_count(&self) -> usize {
        self.processed.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Look up a consumer's registration.
    #[must_use]
    pub fn consumer_registration(
        &self,
        consumer_id: &str,
    ) -> Option<Arc<crate::registry::ConsumerRegistration>> {
        self.consumers.get(consumer_id)
    }

    /// Whether `offer_id` already went through the full pipeline.
    #[must_use]
    pub fn is_processed(&self, offer_id: &str) -> bool {
        self.processed
            .lock()
            .map(|p| p.contains(offer_id))
            .unwrap_or(false)
    }

    /// Handle one `SubmitOffer`.
    ///
    /// The sequence validate → quorum-write → mark-processed → fan-out is
    /// totally ordered for a given `offer_id`; the reply is always a data
    /// ack, never a transport error.
    pub async fn submit_offer(&self, offer: Offer) -> OfferAck {
        self.roster.record_sent(&offer.client_id);
        metrics::counter!("cyberday_offers_submitted").increment(1);

        if let Err(reason) = offer.validate() {
            self.roster.record_rejected(&offer.client_id);
            metrics::counter!("cyberday_offers_rejected").increment(1);
            tracing::warn!(
                offer_id = %offer.offer_id,
                client_id = %offer.client_id,
                reason = %reason,
                "offer rejected"
            );
            return OfferAck::rejected(reason.to_string());
        }

        if self.is_processed(&offer.offer_id) {
            tracing::debug!(offer_id = %offer.offer_id, "duplicate offer suppressed");
            metrics::counter!("cyberday_offers_duplicate").increment(1);
            return OfferAck::accepted(ALREADY_PROCESSED);
        }

        let outcome = self.replicate(&offer).await;
        if !outcome.reached(WRITE_QUORUM) {
            // Not marked processed: a later retry of the same offer_id gets
            // another chance at replication.
            metrics::counter!("cyberday_quorum_unreached").increment(1);
            tracing::warn!(
                offer_id = %offer.offer_id,
                acks = outcome.acks,
                attempted = outcome.attempted,
                "write quorum unreached, offer dropped"
            );
            return OfferAck::rejected(QUORUM_UNREACHED);
        }

        // First writer wins: a concurrent duplicate that lost the race is
        // answered as already processed and must not dispatch again.
        if !self.mark_processed(&offer.offer_id) {
            return OfferAck::accepted(ALREADY_PROCESSED);
        }

        self.roster.record_accepted(&offer.client_id);
        metrics::counter!("cyberday_offers_accepted").increment(1);
        tracing::info!(
            offer_id = %offer.offer_id,
            client_id = %offer.client_id,
            acks = outcome.acks,
            "offer accepted"
        );

        self.fan_out(&offer);
        OfferAck::accepted("offer accepted")
    }

    /// Handle one `RegisterConsumer`.
    pub fn register_consumer(&self, request: &RegisterConsumerRequest) -> RegisterAck {
        if request.consumer_id.is_empty() {
            return RegisterAck {
                ok: false,
                message: "consumer id is required".to_string(),
            };
        }
        let registration = self.consumers.register(request);
        RegisterAck {
            ok: true,
            message: format!("registered {}", registration.consumer_id),
        }
    }

    /// Replicate to every believed-live node, resolving on W acks.
    async fn replicate(&self, offer: &Offer) -> QuorumOutcome {
        let targets = self.cluster.believed_live();

        let calls: Vec<_> = targets
            .into_iter()
            .map(|node| {
                let offer = offer.clone();
                async move {
                    let client = node.client();
                    match client.store(&offer).await {
                        Ok(ack) => {
                            if !ack.ok {
                                tracing::debug!(
                                    node_id = %node.node_id(),
                                    offer_id = %offer.offer_id,
                                    message = %ack.message,
                                    "node refused write"
                                );
                            }
                            node.record_write(ack.ok, true);
                            ack.ok
                        }
                        Err(error) => {
                            tracing::warn!(
                                node_id = %node.node_id(),
                                offer_id = %offer.offer_id,
                                %error,
                                "node write failed"
                            );
                            node.record_write(false, false);
                            false
                        }
                    }
                }
            })
            .collect();

        collect_write_quorum(calls, WRITE_QUORUM, self.write_deadline).await
    }

    /// Insert into the processed set; returns false when already present.
    fn mark_processed(&self, offer_id: &str) -> bool {
        self.processed
            .lock()
            .map(|mut p| p.insert(offer_id.to_string()))
            .unwrap_or(false)
    }

    /// Push the offer to every active, filter-matching consumer.
    ///
    /// Deliveries are best-effort and independent: each runs on its own
    /// task with its own deadline, and a failure only flips that consumer's
    /// `active` bit. The registry snapshot is taken before any I/O starts.
    fn fan_out(&self, offer: &Offer) {
        let matching: Vec<_> = self
            .consumers
            .snapshot()
            .into_iter()
            .filter(|c| c.is_active() && c.filter.matches(offer))
            .collect();

        for registration in matching {
            let offer = offer.clone();
            tokio::spawn(async move {
                let client = registration.client();
                match client.deliver(&offer).await {
                    Ok(ack) if ack.ok => {
                        registration.record_delivered();
                        tracing::debug!(
                            consumer_id = %registration.consumer_id,
                            offer_id = %offer.offer_id,
                            "offer delivered"
                        );
                    }
                    Ok(ack) => {
                        registration.set_active(false);
                        tracing::warn!(
                            consumer_id = %registration.consumer_id,
                            offer_id = %offer.offer_id,
                            message = %ack.message,
                            "consumer refused delivery, marked inactive"
                        );
                    }
                    Err(error) => {
                        registration.set_active(false);
                        tracing::warn!(
                            consumer_id = %registration.consumer_id,
                            offer_id = %offer.offer_id,
                            %error,
                            "delivery failed, consumer marked inactive"
                        );
                    }
                }
            });
        }
    }
}
