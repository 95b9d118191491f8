//! Scripted in-memory implementations of the core client traits.

use cyberday_core::client::ClientFuture;
use cyberday_core::wire::{
    DeliverAck, HistoryReply, OfferAck, ReconcileAck, RegisterAck, RegisterConsumerRequest,
    StoreAck,
};
use cyberday_core::{BrokerClient, ClientError, ConsumerClient, Offer, StorageNodeClient};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

fn lock_poisoned<T>(_: T) -> ClientError {
    ClientError::Transport("mock lock poisoned".to_string())
}

/// An in-memory storage node reachable through the [`StorageNodeClient`]
/// trait.
///
/// Behavior switches:
/// - [`set_down`](Self::set_down): refuse `Store`/`Reconcile` with
///   `ok = false` (the node's simulated-failure state)
/// - [`set_unreachable`](Self::set_unreachable): fail every call at the
///   transport layer
/// - [`set_latency`](Self::set_latency): delay every reply
pub struct MockStorageNode {
    node_id: String,
    offers: Mutex<HashMap<String, Offer>>,
    down: AtomicBool,
    unreachable: AtomicBool,
    latency_ms: AtomicU64,
    store_calls: AtomicUsize,
}

impl MockStorageNode {
    /// A live, empty node.
    #[must_use]
    pub fn new(node_id: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            offers: Mutex::new(HashMap::new()),
            down: AtomicBool::new(false),
            unreachable: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
            store_calls: AtomicUsize::new(0),
        }
    }

    /// Enter or leave the simulated-down state.
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Make every call fail at the transport layer.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Delay every reply by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Whether the node currently holds `offer_id`.
    #[must_use]
    pub fn holds(&self, offer_id: &str) -> bool {
        self.offers
            .lock()
            .map(|m| m.contains_key(offer_id))
            .unwrap_or(false)
    }

    /// Number of offers in the node's map.
    #[must_use]
    pub fn offer_count(&self) -> usize {
        self.offers.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// How many `Store` calls reached this node (including refused ones).
    #[must_use]
    pub fn store_calls(&self) -> usize {
        self.store_calls.load(Ordering::SeqCst)
    }

    /// Insert offers directly, bypassing the RPC surface.
    pub fn seed(&self, offers: &[Offer]) {
        if let Ok(mut map) = self.offers.lock() {
            for offer in offers {
                map.insert(offer.offer_id.clone(), offer.clone());
            }
        }
    }

    async fn pause(&self) {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn check_reachable(&self) -> Result<(), ClientError> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(ClientError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl StorageNodeClient for MockStorageNode {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    fn store(&self, offer: &Offer) -> ClientFuture<'_, StoreAck> {
        let offer = offer.clone();
        Box::pin(async move {
            self.pause().await;
            self.store_calls.fetch_add(1, Ordering::SeqCst);
            self.check_reachable()?;

            if self.down.load(Ordering::SeqCst) {
                return Ok(StoreAck {
                    ok: false,
                    node_id: self.node_id.clone(),
                    message: "node inactive".to_string(),
                });
            }

            self.offers
                .lock()
                .map_err(lock_poisoned)?
                .insert(offer.offer_id.clone(), offer);
            Ok(StoreAck {
                ok: true,
                node_id: self.node_id.clone(),
                message: "ACK".to_string(),
            })
        })
    }

    fn read_all(&self, _caller_id: &str, since_ts: i64) -> ClientFuture<'_, HistoryReply> {
        Box::pin(async move {
            self.pause().await;
            self.check_reachable()?;

            let offers = self
                .offers
                .lock()
                .map_err(lock_poisoned)?
                .values()
                .filter(|o| o.timestamp >= since_ts)
                .cloned()
                .collect();
            Ok(HistoryReply {
                offers,
                node_id: self.node_id.clone(),
            })
        })
    }

    fn reconcile(&self, _source_node: &str, offers: &[Offer]) -> ClientFuture<'_, ReconcileAck> {
        let offers = offers.to_vec();
        Box::pin(async move {
            self.pause().await;
            self.check_reachable()?;

            if self.down.load(Ordering::SeqCst) {
                return Ok(ReconcileAck {
                    ok: false,
                    new_count: 0,
                });
            }

            let mut map = self.offers.lock().map_err(lock_poisoned)?;
            let mut new_count = 0u32;
            for offer in offers {
                if !map.contains_key(&offer.offer_id) {
                    map.insert(offer.offer_id.clone(), offer);
                    new_count += 1;
                }
            }
            Ok(ReconcileAck {
                ok: true,
                new_count,
            })
        })
    }
}

/// An in-memory consumer reachable through the [`ConsumerClient`] trait.
///
/// Records every delivered offer; [`set_active`](Self::set_active) stages the
/// simulated-disconnection reply and
/// [`set_unreachable`](Self::set_unreachable) stages a transport failure.
pub struct MockConsumer {
    consumer_id: String,
    delivered: Mutex<Vec<Offer>>,
    active: AtomicBool,
    unreachable: AtomicBool,
}

impl MockConsumer {
    /// An active, empty consumer.
    #[must_use]
    pub fn new(consumer_id: &str) -> Self {
        Self {
            consumer_id: consumer_id.to_string(),
            delivered: Mutex::new(Vec::new()),
            active: AtomicBool::new(true),
            unreachable: AtomicBool::new(false),
        }
    }

    /// Flip the simulated-connection state.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    /// Make deliveries fail at the transport layer.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Offers delivered so far, in arrival order.
    #[must_use]
    pub fn delivered(&self) -> Vec<Offer> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// Number of deliveries accepted.
    #[must_use]
    pub fn delivered_count(&self) -> usize {
        self.delivered.lock().map(|d| d.len()).unwrap_or(0)
    }
}

impl ConsumerClient for MockConsumer {
    fn deliver(&self, offer: &Offer) -> ClientFuture<'_, DeliverAck> {
        let offer = offer.clone();
        Box::pin(async move {
            if self.unreachable.load(Ordering::SeqCst) {
                return Err(ClientError::Transport("connection refused".to_string()));
            }
            if !self.active.load(Ordering::SeqCst) {
                return Ok(DeliverAck {
                    ok: false,
                    node_id: self.consumer_id.clone(),
                    message: "consumer inactive".to_string(),
                });
            }
            self.delivered.lock().map_err(lock_poisoned)?.push(offer);
            Ok(DeliverAck {
                ok: true,
                node_id: self.consumer_id.clone(),
                message: "offer received".to_string(),
            })
        })
    }
}

/// A scripted broker for exercising consumer-side logic.
///
/// `fetch_history` serves whatever was [`seed_history`](Self::seed_history)ed;
/// registrations and submissions are recorded for assertions.
#[derive(Default)]
pub struct MockBroker {
    history: Mutex<Vec<Offer>>,
    registrations: Mutex<Vec<RegisterConsumerRequest>>,
    submitted: Mutex<Vec<Offer>>,
}

impl MockBroker {
    /// An empty scripted broker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the offers the next `fetch_history` calls will return.
    pub fn seed_history(&self, offers: &[Offer]) {
        if let Ok(mut h) = self.history.lock() {
            h.extend(offers.iter().cloned());
        }
    }

    /// Registrations received so far.
    #[must_use]
    pub fn registrations(&self) -> Vec<RegisterConsumerRequest> {
        self.registrations
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Offers submitted so far.
    #[must_use]
    pub fn submitted(&self) -> Vec<Offer> {
        self.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl BrokerClient for MockBroker {
    fn submit_offer(&self, offer: &Offer) -> ClientFuture<'_, OfferAck> {
        let offer = offer.clone();
        Box::pin(async move {
            self.submitted.lock().map_err(lock_poisoned)?.push(offer);
            Ok(OfferAck::accepted("offer accepted"))
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
            self.registrations.lock().map_err(lock_poisoned)?.push(request);
            Ok(RegisterAck {
                ok: true,
                message: "registered".to_string(),
            })
        })
    }

    fn fetch_history(&self, _consumer_id: &str) -> ClientFuture<'_, HistoryReply> {
        Box::pin(async move {
            let offers = self.history.lock().map_err(lock_poisoned)?.clone();
            Ok(HistoryReply {
                offers,
                node_id: String::new(),
            })
        })
    }
}
