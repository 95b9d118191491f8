//! The consumer's in-process state: delivery handling, the offer list, and
//! the reconnection protocol.

use crate::log::{LogError, OfferLog};
use crate::preferences::Preferences;
use cyberday_core::wire::DeliverAck;
use cyberday_core::{BrokerClient, ClientError, Offer};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Reply message while the consumer simulates a disconnection.
pub const CONSUMER_INACTIVE: &str = "consumer inactive";

/// One consumer's runtime state.
///
/// The offer list and its id set grow monotonically; the id set is what
/// makes re-sync idempotent. The `active` bit simulates connectivity: while
/// false, pushed deliveries are refused so the broker marks this consumer
/// inactive and stops pushing until re-registration.
pub struct ConsumerService {
    preferences: Preferences,
    address: String,
    broker: Arc<dyn BrokerClient>,
    log: OfferLog,
    offers: Mutex<Vec<Offer>>,
    seen: Mutex<HashSet<String>>,
    active: AtomicBool,
}

impl ConsumerService {
    /// Build the service.
    #[must_use]
    pub fn new(
        preferences: Preferences,
        address: String,
        broker: Arc<dyn BrokerClient>,
        log: OfferLog,
    ) -> Self {
        Self {
            preferences,
            address,
            broker,
            log,
            offers: Mutex::new(Vec::new()),
            seen: Mutex::new(HashSet::new()),
            active: AtomicBool::new(true),
        }
    }

    /// The consumer's identity.
    #[must_use]
    pub fn consumer_id(&self) -> &str {
        &self.preferences.consumer_id
    }

    /// Whether the consumer currently accepts deliveries.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Flip the simulated-connectivity state.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Offers received so far (pushed or re-synced).
    #[must_use]
    pub fn offers(&self) -> Vec<Offer> {
        self.offers.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Handle one pushed `DeliverOffer`.
    ///
    /// While inactive the push is refused at the data level; the broker
    /// reads that as a failed delivery. Otherwise the offer is recorded in
    /// memory and appended to the CSV log.
    pub fn deliver(&self, offer: Offer) -> DeliverAck {
        if !self.is_active() {
            return DeliverAck {
                ok: false,
                node_id: self.consumer_id().to_string(),
                message: CONSUMER_INACTIVE.to_string(),
            };
        }

        tracing::info!(
            consumer_id = %self.consumer_id(),
            offer_id = %offer.offer_id,
            product = %offer.product,
            price = offer.discount_price,
            "offer received"
        );
        if let Err(error) = self.record(offer) {
            tracing::error!(
                consumer_id = %self.consumer_id(),
                %error,
                "failed to append offer to log"
            );
        }

        DeliverAck {
            ok: true,
            node_id: self.consumer_id().to_string(),
            message: "offer received".to_string(),
        }
    }

    /// Register (or re-register) with the broker.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the broker is unreachable, or a
    /// [`ClientError::InvalidReply`] when the broker refuses the
    /// registration.
    pub async fn register(&self) -> Result<(), ClientError> {
        let ack = self
            .broker
            .register_consumer(
                self.consumer_id(),
                &self.preferences.categories,
                &self.preferences.stores,
                self.preferences.max_price,
                &self.address,
            )
            .await?;

        if !ack.ok {
            return Err(ClientError::InvalidReply(format!(
                "broker refused registration: {}",
                ack.message
            )));
        }
        tracing::info!(consumer_id = %self.consumer_id(), "registered with broker");
        Ok(())
    }

    /// The reconnection protocol: fetch history and append what is missing.
    ///
    /// Every returned offer already matches this consumer's filter (the
    /// broker filters server-side); the id set suppresses offers that were
    /// pushed before the disconnection. Returns how many offers were new.
    ///
    /// # Errors
    ///
    /// Returns the transport error when the broker is unreachable.
    pub async fn resync(&self) -> Result<usize, ClientError> {
        let reply = self.broker.fetch_history(self.consumer_id()).await?;
        tracing::info!(
            consumer_id = %self.consumer_id(),
            offers = reply.offers.len(),
            "history received"
        );

        let mut recovered = 0usize;
        for offer in reply.offers {
            let known = self
                .seen
                .lock()
                .map(|s| s.contains(&offer.offer_id))
                .unwrap_or(true);
            if known {
                continue;
            }
            if let Err(error) = self.record(offer) {
                tracing::error!(
                    consumer_id = %self.consumer_id(),
                    %error,
                    "failed to append recovered offer"
                );
                continue;
            }
            recovered += 1;
        }

        tracing::info!(
            consumer_id = %self.consumer_id(),
            recovered,
            "re-sync complete"
        );
        Ok(recovered)
    }

    fn record(&self, offer: Offer) -> Result<(), LogError> {
        self.log.append(&offer)?;
        if let Ok(mut seen) = self.seen.lock() {
            seen.insert(offer.offer_id.clone());
        }
        if let Ok(mut offers) = self.offers.lock() {
            offers.push(offer);
        }
        Ok(())
    }
}

/// When and for how long the consumer simulates a disconnection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisconnectSchedule {
    /// Delay after boot before the disconnection starts.
    pub after: std::time::Duration,
    /// How long the disconnection lasts.
    pub duration: std::time::Duration,
}

/// Settle time between reconnecting and asking for history.
const RECONNECT_SETTLE: std::time::Duration = std::time::Duration::from_secs(2);

/// Run one simulated disconnection cycle: refuse deliveries for a while,
/// then reconnect, re-register so push delivery resumes, and re-sync the
/// missed offers from history.
pub async fn run_disconnect_cycle(service: Arc<ConsumerService>, schedule: DisconnectSchedule) {
    tokio::time::sleep(schedule.after).await;

    tracing::warn!(
        consumer_id = %service.consumer_id(),
        duration_secs = schedule.duration.as_secs(),
        "simulating disconnection"
    );
    service.set_active(false);

    tokio::time::sleep(schedule.duration).await;
    service.set_active(true);
    tracing::warn!(consumer_id = %service.consumer_id(), "reconnected, recovering history");

    tokio::time::sleep(RECONNECT_SETTLE).await;
    if let Err(error) = service.register().await {
        tracing::error!(consumer_id = %service.consumer_id(), %error, "re-registration failed");
    }
    if let Err(error) = service.resync().await {
        tracing::error!(consumer_id = %service.consumer_id(), %error, "re-sync failed");
    }
}
