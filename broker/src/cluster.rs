//! The broker's view of the static storage cluster.
//!
//! The three-node cluster is declared at startup and never changes: an
//! ordered array of descriptors, each pairing a client handle with a
//! believed-live bit and write counters. The live bit is local knowledge
//! only, updated from RPC outcomes — a node that refuses a write because it
//! is simulating an outage is still *reachable* and stays believed-live;
//! only transport failures flip the bit.

use cyberday_core::StorageNodeClient;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Replication parameters: cluster size, write quorum, read quorum.
///
/// `R + W > N` guarantees overlapping quorums.
pub const CLUSTER_SIZE: usize = 3;
/// Write quorum.
pub const WRITE_QUORUM: usize = 2;
/// Read quorum.
pub const READ_QUORUM: usize = 2;

/// One storage node as the broker sees it.
pub struct NodeDescriptor {
    client: Arc<dyn StorageNodeClient>,
    live: AtomicBool,
    writes_ok: AtomicU64,
    writes_failed: AtomicU64,
}

impl NodeDescriptor {
    /// Wrap a client handle; nodes start out believed live.
    #[must_use]
    pub fn new(client: Arc<dyn StorageNodeClient>) -> Self {
        Self {
            client,
            live: AtomicBool::new(true),
            writes_ok: AtomicU64::new(0),
            writes_failed: AtomicU64::new(0),
        }
    }

    /// The node's id.
    #[must_use]
    pub fn node_id(&self) -> &str {
        self.client.node_id()
    }

    /// The client handle.
    #[must_use]
    pub fn client(&self) -> Arc<dyn StorageNodeClient> {
        Arc::clone(&self.client)
    }

    /// Whether the broker currently believes the node reachable.
    #[must_use]
    pub fn believed_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Record the outcome of a `Store` call.
    ///
    /// `acked` counts toward `writes_ok`; a refusal or transport failure
    /// counts toward `writes_failed`. `reachable` feeds the live bit.
    pub fn record_write(&self, acked: bool, reachable: bool) {
        if acked {
            self.writes_ok.fetch_add(1, Ordering::SeqCst);
        } else {
            self.writes_failed.fetch_add(1, Ordering::SeqCst);
        }
        self.live.store(reachable, Ordering::SeqCst);
        let outcome = if acked { "ok" } else { "failed" };
        metrics::counter!(
            "cyberday_node_writes",
            "node" => self.node_id().to_string(),
            "outcome" => outcome
        )
        .increment(1);
    }

    /// Record the outcome of a read, which only feeds the live bit.
    pub fn record_read(&self, reachable: bool) {
        self.live.store(reachable, Ordering::SeqCst);
    }

    /// Successful writes so far.
    #[must_use]
    pub fn writes_ok(&self) -> u64 {
        self.writes_ok.load(Ordering::SeqCst)
    }

    /// Failed or refused writes so far.
    #[must_use]
    pub fn writes_failed(&self) -> u64 {
        self.writes_failed.load(Ordering::SeqCst)
    }
}

/// The ordered, static node set.
pub struct Cluster {
    nodes: Vec<Arc<NodeDescriptor>>,
}

impl Cluster {
    /// Build the cluster view from the declared node clients, in order.
    #[must_use]
    pub fn new(clients: Vec<Arc<dyn StorageNodeClient>>) -> Self {
        Self {
            nodes: clients
                .into_iter()
                .map(|c| Arc::new(NodeDescriptor::new(c)))
                .collect(),
        }
    }

    /// All descriptors, in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[Arc<NodeDescriptor>] {
        &self.nodes
    }

    /// Descriptors of nodes currently believed live.
    #[must_use]
    pub fn believed_live(&self) -> Vec<Arc<NodeDescriptor>> {
        self.nodes
            .iter()
            .filter(|n| n.believed_live())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyberday_testing::mocks::MockStorageNode;

    fn cluster() -> Cluster {
        Cluster::new(vec![
            Arc::new(MockStorageNode::new("DB1")),
            Arc::new(MockStorageNode::new("DB2")),
            Arc::new(MockStorageNode::new("DB3")),
        ])
    }

    #[test]
    fn nodes_start_believed_live() {
        let cluster = cluster();
        assert_eq!(cluster.believed_live().len(), 3);
    }

    #[test]
    fn transport_failure_flips_the_live_bit() {
        let cluster = cluster();
        cluster.nodes()[1].record_write(false, false);
        let live = cluster.believed_live();
        assert_eq!(live.len(), 2);
        assert!(live.iter().all(|n| n.node_id() != "DB2"));
    }

    #[test]
    fn refused_write_keeps_the_node_live() {
        let cluster = cluster();
        // Simulated-down nodes still answer; they are failed writes but
        // remain reachable.
        cluster.nodes()[2].record_write(false, true);
        assert_eq!(cluster.believed_live().len(), 3);
        assert_eq!(cluster.nodes()[2].writes_failed(), 1);
    }

    #[test]
    fn write_counters_accumulate() {
        let cluster = cluster();
        cluster.nodes()[0].record_write(true, true);
        cluster.nodes()[0].record_write(true, true);
        cluster.nodes()[0].record_write(false, true);
        assert_eq!(cluster.nodes()[0].writes_ok(), 2);
        assert_eq!(cluster.nodes()[0].writes_failed(), 1);
    }
}
