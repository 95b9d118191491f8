//! Anti-entropy: periodic full-state pushes to peers, and the recovery
//! pull a node performs after an outage.
//!
//! Every gossip period the node snapshots its offer set and pushes it to
//! each peer concurrently. Recipients merge only previously-absent ids, so
//! the symmetric difference between any two live nodes shrinks with every
//! round. The snapshot is taken before any network I/O; no lock is held
//! across a push.

use crate::store::NodeStore;
use cyberday_core::StorageNodeClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Default period between anti-entropy rounds.
pub const DEFAULT_GOSSIP_PERIOD: Duration = Duration::from_secs(30);

/// Run the gossip loop until `shutdown` signals.
///
/// Each tick pushes the node's full snapshot to every peer in parallel.
/// An empty snapshot skips the round; a node simulating an outage also
/// skips (its peers keep pushing *to* it, which it refuses while down).
pub async fn run(
    store: Arc<NodeStore>,
    peers: Arc<[Arc<dyn StorageNodeClient>]>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick of a tokio interval fires immediately; consume it so
    // rounds start one full period after boot.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                push_round(&store, &peers).await;
            }
            _ = shutdown.changed() => {
                tracing::info!(node_id = %store.node_id(), "gossip loop stopping");
                return;
            }
        }
    }
}

/// One anti-entropy round: push the full snapshot to every peer.
pub async fn push_round(store: &Arc<NodeStore>, peers: &Arc<[Arc<dyn StorageNodeClient>]>) {
    if !store.is_active() {
        return;
    }
    let snapshot = store.snapshot();
    if snapshot.is_empty() {
        return;
    }

    let pushes = peers.iter().map(|peer| {
        let snapshot = snapshot.clone();
        async move {
            match peer.reconcile(store.node_id(), &snapshot).await {
                Ok(ack) if ack.ok => {
                    if ack.new_count > 0 {
                        tracing::info!(
                            node_id = %store.node_id(),
                            peer = %peer.node_id(),
                            new_count = ack.new_count,
                            "peer merged offers"
                        );
                    }
                    metrics::counter!("cyberday_gossip_pushes", "outcome" => "ok").increment(1);
                }
                Ok(_) => {
                    tracing::debug!(
                        node_id = %store.node_id(),
                        peer = %peer.node_id(),
                        "peer refused reconcile (inactive)"
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        node_id = %store.node_id(),
                        peer = %peer.node_id(),
                        %error,
                        "gossip push failed"
                    );
                    metrics::counter!("cyberday_gossip_pushes", "outcome" => "failed")
                        .increment(1);
                }
            }
        }
    });

    futures::future::join_all(pushes).await;
}

/// Recovery pull: merge the first reachable peer's full set.
///
/// Called when a node leaves its simulated-down state. Peers are tried in
/// declaration order; the first successful `ReadAll` is merged and
/// persisted, bounding the staleness window to one gossip period plus this
/// pull.
pub async fn recovery_pull(store: &Arc<NodeStore>, peers: &Arc<[Arc<dyn StorageNodeClient>]>) {
    for peer in peers.iter() {
        match peer.read_all(store.node_id(), 0).await {
            Ok(reply) => {
                let added = store.merge(reply.offers);
                if added > 0 {
                    if let Err(error) = store.persist() {
                        tracing::error!(
                            node_id = %store.node_id(),
                            %error,
                            "persistence failed after recovery pull"
                        );
                    }
                }
                tracing::info!(
                    node_id = %store.node_id(),
                    peer = %peer.node_id(),
                    added,
                    "recovery pull complete"
                );
                return;
            }
            Err(error) => {
                tracing::warn!(
                    node_id = %store.node_id(),
                    peer = %peer.node_id(),
                    %error,
                    "recovery pull failed, trying next peer"
                );
            }
        }
    }
    tracing::error!(node_id = %store.node_id(), "recovery pull exhausted all peers");
}
