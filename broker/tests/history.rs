//! Quorum-read scenarios: union merge, read-quorum failure, per-consumer
//! filtering, and the full reconnection recovery flow.

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

    fn register(&self, id: &str, categories: &[&str]) -> Arc<MockConsumer> {
        let address = format!("{id}:50061");
        let ack = self.broker.register_consumer(&RegisterConsumerRequest {
            consumer_id: id.to_string(),
            categories: categories.iter().map(|s| (*s).to_string()).collect(),
            stores: vec!["null".to_string()],
            max_price: 0,
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

fn sorted_ids(reply: &cyberday_core::wire::HistoryReply) -> Vec<String> {
    let mut ids: Vec<String> = reply.offers.iter().map(|o| o.offer_id.clone()).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn history_unions_node_views_without_duplicates() {
    let h = Harness::new();
    // Diverged replicas: B exists on both, A and C on one each.
    h.nodes[0].seed(&[offer("A").build(), offer("B").build()]);
    h.nodes[1].seed(&[offer("B").build(), offer("C").build()]);

    let reply = h.broker.fetch_history("anonymous").await;
    assert_eq!(sorted_ids(&reply), vec!["A", "B", "C"]);
}

#[tokio::test]
async fn read_quorum_failure_returns_empty() {
    let h = Harness::new();
    h.nodes[0].seed(&[offer("A").build()]);
    h.nodes[1].set_unreachable(true);
    h.nodes[2].set_unreachable(true);

    // One reply is below R=2: a partial view must not be served.
    let reply = h.broker.fetch_history("anonymous").await;
    assert!(reply.offers.is_empty());
}

#[tokio::test]
async fn down_nodes_still_serve_reads() {
    let h = Harness::new();
    h.nodes[0].seed(&[offer("A").build()]);
    h.nodes[1].seed(&[offer("A").build()]);
    // Simulated-down refuses writes, not reads.
    h.nodes[0].set_down(true);
    h.nodes[1].set_down(true);

    let reply = h.broker.fetch_history("anonymous").await;
    assert_eq!(sorted_ids(&reply), vec!["A"]);
}

#[tokio::test]
async fn history_is_filtered_for_registered_consumers() {
    let h = Harness::new();
    h.register("C-M1", &["Moda"]);
    let mixed = [
        offer("m1").category("Moda").build(),
        offer("h1").category("Hogar").build(),
        offer("m2").category("Moda").build(),
    ];
    h.nodes[0].seed(&mixed);
    h.nodes[1].seed(&mixed);

    let reply = h.broker.fetch_history("C-M1").await;
    assert_eq!(sorted_ids(&reply), vec!["m1", "m2"]);

    // An unregistered caller sees the unfiltered union.
    let unfiltered = h.broker.fetch_history("someone-else").await;
    assert_eq!(unfiltered.offers.len(), 3);
}

#[tokio::test]
async fn reconnection_recovery_yields_every_missed_offer_once() {
    let h = Harness::new();
    let consumer = h.register("C-M1", &["Moda"]);

    // C and D arrive while the consumer is connected.
    assert!(h.broker.submit_offer(offer("C").category("Moda").build()).await.ok);
    assert!(h.broker.submit_offer(offer("D").category("Moda").build()).await.ok);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(consumer.delivered_count(), 2);

    // The consumer drops; E's delivery fails and flips the registration.
    consumer.set_active(false);
    assert!(h.broker.submit_offer(offer("E").category("Moda").build()).await.ok);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(consumer.delivered_count(), 2);

    // On reconnection the consumer asks for history: C, D and E, each once.
    consumer.set_active(true);
    let reply = h.broker.fetch_history("C-M1").await;
    assert_eq!(sorted_ids(&reply), vec!["C", "D", "E"]);
}
