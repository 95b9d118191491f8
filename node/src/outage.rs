//! Scheduled outage simulation.
//!
//! For failure-mode demonstrations a node can be told to go down a fixed
//! time after boot and come back a fixed time later. While down, `Store`
//! and `Reconcile` are refused at the data level; `ReadAll` keeps serving.
//! On recovery the node pulls the full set from its peers before resuming.

use crate::gossip;
use crate::store::NodeStore;
use cyberday_core::StorageNodeClient;
use std::sync::Arc;
use std::time::Duration;

/// When and for how long the node simulates being down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutageSchedule {
    /// Delay after boot before the outage starts.
    pub after: Duration,
    /// How long the outage lasts.
    pub duration: Duration,
}

/// Settle time between coming back up and starting the recovery pull.
const RECOVERY_SETTLE: Duration = Duration::from_secs(2);

/// Run one scheduled outage cycle: wait, go down, wait, recover, pull.
pub async fn run(
    store: Arc<NodeStore>,
    peers: Arc<[Arc<dyn StorageNodeClient>]>,
    schedule: OutageSchedule,
) {
    tokio::time::sleep(schedule.after).await;

    tracing::warn!(
        node_id = %store.node_id(),
        duration_secs = schedule.duration.as_secs(),
        "simulating outage"
    );
    store.set_active(false);

    tokio::time::sleep(schedule.duration).await;

    store.set_active(true);
    tracing::warn!(node_id = %store.node_id(), "recovered from outage, resyncing");

    tokio::time::sleep(RECOVERY_SETTLE).await;
    gossip::recovery_pull(&store, &peers).await;
}
