//! Producer roster and consumer registry.
//!
//! The roster is mutation-heavy (two counter bumps per submission) and sits
//! behind a plain mutex. The consumer registry is read-heavy — every
//! accepted offer snapshots it for fan-out — and uses a many-reader lock.
//! Neither lock is ever held across an outbound call.

use cyberday_core::wire::RegisterConsumerRequest;
use cyberday_core::{ConsumerClient, SubscriptionFilter};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Per-producer submission counters, all monotonic within a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Submissions received, valid or not.
    pub sent: u64,
    /// Fresh submissions that reached write quorum.
    pub accepted: u64,
    /// Submissions refused by validation.
    pub rejected: u64,
}

/// The set of producers seen this run, keyed by `client_id`.
///
/// Producers are never pre-declared; the first submission creates the entry.
#[derive(Default)]
pub struct ProducerRoster {
    producers: Mutex<HashMap<String, ProducerStats>>,
}

impl ProducerRoster {
    /// An empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a submission from `client_id`, creating the entry on first use.
    pub fn record_sent(&self, client_id: &str) {
        if let Ok(mut producers) = self.producers.lock() {
            let entry = producers.entry(client_id.to_string()).or_default();
            entry.sent += 1;
        }
    }

    /// Count a quorum-accepted submission.
    pub fn record_accepted(&self, client_id: &str) {
        if let Ok(mut producers) = self.producers.lock() {
            producers.entry(client_id.to_string()).or_default().accepted += 1;
        }
    }

    /// Count a validation rejection.
    pub fn record_rejected(&self, client_id: &str) {
        if let Ok(mut producers) = self.producers.lock() {
            producers.entry(client_id.to_string()).or_default().rejected += 1;
        }
    }

    /// Snapshot all counters, sorted by producer id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, ProducerStats)> {
        let mut rows: Vec<_> = self
            .producers
            .lock()
            .map(|p| p.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows
    }
}

/// One registered consumer.
///
/// Created on first successful register; never deleted within a run. The
/// `active` bit flips false when a push delivery fails and back to true when
/// the consumer re-registers after reconnecting.
pub struct ConsumerRegistration {
    /// Consumer identity.
    pub consumer_id: String,
    /// Where deliveries are pushed.
    pub address: String,
    /// The subscription constraint.
    pub filter: SubscriptionFilter,
    client: Arc<dyn ConsumerClient>,
    active: AtomicBool,
    delivered: AtomicU64,
}

impl ConsumerRegistration {
    /// The push client for this consumer.
    #[must_use]
    pub fn client(&self) -> Arc<dyn ConsumerClient> {
        Arc::clone(&self.client)
    }

    /// Whether the broker still considers this consumer reachable.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Mark the consumer unreachable (push failed) or reachable again.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Count a successful delivery.
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::SeqCst);
        metrics::counter!("cyberday_deliveries", "consumer" => self.consumer_id.clone())
            .increment(1);
    }

    /// Deliveries accepted by this consumer so far.
    #[must_use]
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }
}

/// Builds a push client for a consumer address.
///
/// Production wires an HTTP client factory here; tests hand out mocks.
pub type ConsumerConnector = Arc<dyn Fn(&str) -> Arc<dyn ConsumerClient> + Send + Sync>;

/// All registered consumers, keyed by id.
pub struct ConsumerRegistry {
    consumers: RwLock<HashMap<String, Arc<ConsumerRegistration>>>,
    connect: ConsumerConnector,
}

impl ConsumerRegistry {
    /// An empty registry that builds push clients with `connect`.
    #[must_use]
    pub fn new(connect: ConsumerConnector) -> Self {
        Self {
            consumers: RwLock::new(HashMap::new()),
            connect,
        }
    }

    /// Register a consumer, or re-activate and update an existing
    /// registration.
    ///
    /// Re-registration is how a consumer resumes push delivery after a
    /// disconnection: the filter and address are refreshed, the `active` bit
    /// is set, and the delivery counter survives.
    pub fn register(&self, request: &RegisterConsumerRequest) -> Arc<ConsumerRegistration> {
        let filter = SubscriptionFilter::from_sentinel(
            &request.categories,
            &request.stores,
            request.max_price,
        );

        if let Ok(consumers) = self.consumers.read() {
            if let Some(existing) = consumers.get(&request.consumer_id) {
                if existing.address == request.address && existing.filter == filter {
                    existing.set_active(true);
                    tracing::info!(
                        consumer_id = %request.consumer_id,
                        "consumer re-registered, resuming delivery"
                    );
                    return Arc::clone(existing);
                }
            }
        }

        let registration = Arc::new(ConsumerRegistration {
            consumer_id: request.consumer_id.clone(),
            address: request.address.clone(),
            filter,
            client: (self.connect)(&request.address),
            active: AtomicBool::new(true),
            delivered: AtomicU64::new(0),
        });

        if let Ok(mut consumers) = self.consumers.write() {
            // Carry the delivery counter across a filter or address change.
            if let Some(previous) = consumers.get(&request.consumer_id) {
                registration
                    .delivered
                    .store(previous.delivered(), Ordering::SeqCst);
            }
            consumers.insert(request.consumer_id.clone(), Arc::clone(&registration));
        }

        tracing::info!(
            consumer_id = %request.consumer_id,
            address = %request.address,
            "consumer registered"
        );
        registration
    }

    /// Look up one registration.
    #[must_use]
    pub fn get(&self, consumer_id: &str) -> Option<Arc<ConsumerRegistration>> {
        self.consumers
            .read()
            .ok()
            .and_then(|c| c.get(consumer_id).cloned())
    }

    /// Snapshot every registration, for fan-out or reporting.
    ///
    /// The read lock is released before the snapshot is used for I/O.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<ConsumerRegistration>> {
        let mut rows: Vec<_> = self
            .consumers
            .read()
            .map(|c| c.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| a.consumer_id.cmp(&b.consumer_id));
        rows
    }
}
