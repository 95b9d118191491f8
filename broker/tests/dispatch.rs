//! End-to-end dispatcher scenarios against in-memory nodes and consumers:
//! happy path, duplicate suppression, quorum failure, push failure and
//! filter exclusion.

use cyberday_broker::{Broker, Cluster, ConsumerConnector};
use cyberday_core::wire::RegisterConsumerRequest;
use cyberday_core::{ConsumerClient, StorageNodeClient};
use cyberday_testing::mocks::{MockConsumer, MockStorageNode};
use cyberday_testing::offer;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Harness {
    broker: Arc<Broker>,
    nodes: Vec<Arc<MockStorageNode>>,
    consumers: Arc<Mutex<HashMap<String, Arc<MockConsumer>>>>,
}

impl Harness {
    fn new() -> Self {
        let nodes: Vec<Arc<MockStorageNode>> = ["DB1", "DB2", "DB3"]
            .into_iter()
            .map(|id| Arc::new(MockStorageNode::new(id)))
            .collect();
        let cluster = Cluster::new(
            nodes
                .iter()
                .map(|n| Arc::clone(n) as Arc<dyn StorageNodeClient>)
                .collect(),
        );

        let consumers: Arc<Mutex<HashMap<String, Arc<MockConsumer>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let connect: ConsumerConnector = {
            let consumers = Arc::clone(&consumers);
            Arc::new(move |addr: &str| {
                let consumer = Arc::new(MockConsumer::new(addr));
                if let Ok(mut map) = consumers.lock() {
                    map.insert(addr.to_string(), Arc::clone(&consumer));
                }
                consumer as Arc<dyn ConsumerClient>
            })
        };

        Self {
            broker: Arc::new(
                Broker::new(cluster, connect).with_write_deadline(Duration::from_millis(500)),
            ),
            nodes,
            consumers,
        }
    }

    fn register(&self, id: &str, categories: &[&str], max_price: u32) -> Arc<MockConsumer> {
        let address = format!("{id}:50061");
        let ack = self.broker.register_consumer(&RegisterConsumerRequest {
            consumer_id: id.to_string(),
            categories: categories.iter().map(|s| (*s).to_string()).collect(),
            stores: vec!["null".to_string()],
            max_price,
            address: address.clone(),
        });
        assert!(ack.ok);
        self.consumers
            .lock()
            .ok()
            .and_then(|m| m.get(&address).cloned())
            .unwrap_or_else(|| Arc::new(MockConsumer::new(&address)))
    }
}

/// Let spawned fan-out and straggler tasks run to completion.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn happy_path_replicates_and_delivers_once() {
    let h = Harness::new();
    let consumer = h.register("C-M1", &["Moda"], 0);

    let ack = h
        .broker
        .submit_offer(offer("A").category("Moda").price(1_000).build())
        .await;
    assert!(ack.ok);
    settle().await;

    // All three nodes hold A (the third write completed as a straggler).
    for node in &h.nodes {
        assert!(node.holds("A"), "{} should hold A", node.node_id());
    }

    // The matching consumer received it exactly once.
    assert_eq!(consumer.delivered_count(), 1);
    assert_eq!(consumer.delivered()[0].offer_id, "A");
    assert!(h.broker.is_processed("A"));
}

#[tokio::test]
async fn duplicate_submission_has_no_side_effects() {
    let h = Harness::new();
    let consumer = h.register("C-M1", &["Moda"], 0);

    let first = h.broker.submit_offer(offer("A").category("Moda").build()).await;
    assert!(first.ok);
    settle().await;
    let stores_before: usize = h.nodes.iter().map(|n| n.store_calls()).sum();

    let second = h.broker.submit_offer(offer("A").category("Moda").build()).await;
    assert!(second.ok);
    assert_eq!(second.message, "already processed");
    settle().await;

    let stores_after: usize = h.nodes.iter().map(|n| n.store_calls()).sum();
    assert_eq!(stores_before, stores_after);
    assert_eq!(consumer.delivered_count(), 1);
}

#[tokio::test]
async fn quorum_unreached_drops_the_offer() {
    let h = Harness::new();
    h.nodes[1].set_down(true);
    h.nodes[2].set_down(true);

    let ack = h.broker.submit_offer(offer("B").build()).await;
    assert!(!ack.ok);
    assert_eq!(ack.message, "quorum unreached");
    settle().await;

    // Not marked processed: a retry gets another chance once nodes return.
    assert!(!h.broker.is_processed("B"));
    assert!(!h.nodes[1].holds("B"));
    assert!(!h.nodes[2].holds("B"));

    // After recovery, the retry goes through.
    h.nodes[1].set_down(false);
    h.nodes[2].set_down(false);
    let retry = h.broker.submit_offer(offer("B").build()).await;
    assert!(retry.ok);
    assert!(h.broker.is_processed("B"));
}

#[tokio::test]
async fn invalid_offers_are_rejected_before_dedup() {
    let h = Harness::new();

    let zero_stock = h.broker.submit_offer(offer("Z").stock(0).build()).await;
    assert!(!zero_stock.ok);

    let bad_category = h
        .broker
        .submit_offer(offer("Z").category("Jardinería").build())
        .await;
    assert!(!bad_category.ok);

    let empty_id = h.broker.submit_offer(offer("").build()).await;
    assert!(!empty_id.ok);

    // A rejected offer never reaches the processed set; a corrected retry
    // with the same id is accepted.
    assert!(!h.broker.is_processed("Z"));
    let corrected = h.broker.submit_offer(offer("Z").stock(1).build()).await;
    assert!(corrected.ok);
}

#[tokio::test]
async fn failed_push_marks_consumer_inactive_without_retry() {
    let h = Harness::new();
    let consumer = h.register("C-M1", &["Moda"], 0);
    consumer.set_active(false);

    let ack = h.broker.submit_offer(offer("A").category("Moda").build()).await;
    assert!(ack.ok);
    settle().await;

    assert_eq!(consumer.delivered_count(), 0);
    let registration = h.broker.consumer_registration("C-M1");
    assert!(registration.is_some_and(|r| !r.is_active()));

    // Later offers are not pushed to an inactive consumer.
    consumer.set_active(true);
    h.broker.submit_offer(offer("B").category("Moda").build()).await;
    settle().await;
    assert_eq!(consumer.delivered_count(), 0);
}

#[tokio::test]
async fn filter_excludes_non_matching_offers() {
    let h = Harness::new();
    let moda = h.register("C-M1", &["Moda"], 0);
    let hogar = h.register("C-H1", &["Hogar"], 0);

    let ack = h
        .broker
        .submit_offer(offer("G").category("Hogar").price(5_000).build())
        .await;
    assert!(ack.ok);
    settle().await;

    assert_eq!(moda.delivered_count(), 0);
    assert_eq!(hogar.delivered_count(), 1);
}

#[tokio::test]
async fn price_ceiling_filters_deliveries() {
    let h = Harness::new();
    let capped = h.register("C-M1", &["null"], 2_000);
    let unlimited = h.register("C-M2", &["null"], 0);

    h.broker
        .submit_offer(offer("cheap").price(2_000).build())
        .await;
    h.broker
        .submit_offer(offer("dear").price(2_001).build())
        .await;
    settle().await;

    let capped_ids: Vec<String> = capped
        .delivered()
        .iter()
        .map(|o| o.offer_id.clone())
        .collect();
    assert_eq!(capped_ids, vec!["cheap"]);
    assert_eq!(unlimited.delivered_count(), 2);
}

#[tokio::test]
async fn concurrent_duplicates_dispatch_at_most_once() {
    let h = Harness::new();
    let consumer = h.register("C-M1", &["Moda"], 0);

    let submissions: Vec<_> = (0..8)
        .map(|_| {
            let broker = Arc::clone(&h.broker);
            tokio::spawn(async move {
                broker
                    .submit_offer(offer("A").category("Moda").build())
                    .await
            })
        })
        .collect();
    for task in submissions {
        let ack = task.await.unwrap_or_else(|_| {
            cyberday_core::wire::OfferAck::rejected("task panicked")
        });
        assert!(ack.ok);
    }
    settle().await;

    assert_eq!(consumer.delivered_count(), 1);
}

#[tokio::test]
async fn slow_node_does_not_block_quorum() {
    let h = Harness::new();
    h.nodes[2].set_latency(Duration::from_millis(5_000));

    let started = std::time::Instant::now();
    let ack = h.broker.submit_offer(offer("A").build()).await;
    assert!(ack.ok);

    // Two fast acks satisfy W=2; the slow node must not gate the reply.
    assert!(started.elapsed() < Duration::from_secs(2));
}
