//! The local offer map and its on-disk form.

use cyberday_core::wire::{HistoryReply, ReconcileAck, StoreAck};
use cyberday_core::Offer;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};
use thiserror::Error;

/// Reply message for writes refused while the node simulates an outage.
pub const NODE_INACTIVE: &str = "node inactive";

/// Persistence failures.
#[derive(Error, Debug)]
pub enum PersistError {
    /// Reading or writing the persistence file failed.
    #[error("persistence i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The persistence file holds something that is not an offer map.
    #[error("persistence file corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A storage node's state: the offer map, the active bit, and the
/// persistence file.
///
/// The map only ever grows within a run. Offers are immutable, so an
/// insert under an existing key overwrites with an equivalent value.
pub struct NodeStore {
    node_id: String,
    offers: RwLock<HashMap<String, Offer>>,
    active: AtomicBool,
    persist_path: PathBuf,
    // Serializes whole-file rewrites so concurrent stores cannot interleave
    // temp-file renames.
    persist_guard: Mutex<()>,
}

impl NodeStore {
    /// An empty store persisting to `<node_id>_ofertas.json` under `dir`.
    #[must_use]
    pub fn new(node_id: &str, dir: &Path) -> Self {
        Self {
            node_id: node_id.to_string(),
            offers: RwLock::new(HashMap::new()),
            active: AtomicBool::new(true),
            persist_path: dir.join(format!("{node_id}_ofertas.json")),
            persist_guard: Mutex::new(()),
        }
    }

    /// The node's identity.
    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// The file this node persists to.
    #[must_use]
    pub fn persist_path(&self) -> &Path {
        &self.persist_path
    }

    /// Whether the node currently accepts writes.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Enter or leave the simulated-down state.
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
        metrics::gauge!("cyberday_node_active", "node" => self.node_id.clone())
            .set(if active { 1.0 } else { 0.0 });
    }

    /// Number of offers held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offers.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the node holds `offer_id`.
    #[must_use]
    pub fn holds(&self, offer_id: &str) -> bool {
        self.offers
            .read()
            .map(|m| m.contains_key(offer_id))
            .unwrap_or(false)
    }

    /// Handle one `Store` call.
    ///
    /// While simulated-down the write is refused with a data-level ack.
    /// Otherwise the offer is inserted (overwriting an equivalent value if
    /// present) and the whole map is rewritten to disk. A persistence
    /// failure is logged but does not fail the ack; the in-memory copy is
    /// authoritative within the run and gossip re-spreads it.
    pub fn store(&self, offer: Offer) -> StoreAck {
        if !self.is_active() {
            return StoreAck {
                ok: false,
                node_id: self.node_id.clone(),
                message: NODE_INACTIVE.to_string(),
            };
        }

        let offer_id = offer.offer_id.clone();
        if let Ok(mut map) = self.offers.write() {
            map.insert(offer_id.clone(), offer);
        }
        tracing::debug!(node_id = %self.node_id, %offer_id, "offer stored");

        if let Err(error) = self.persist() {
            tracing::error!(node_id = %self.node_id, %error, "persistence failed");
        }

        StoreAck {
            ok: true,
            node_id: self.node_id.clone(),
            message: "ACK".to_string(),
        }
    }

    /// Handle one `ReadAll` call: offers with `timestamp >= since_ts`.
    ///
    /// Reads are served even while simulated-down; only the write path is
    /// affected by an outage.
    #[must_use]
    pub fn read_all(&self, since_ts: i64) -> HistoryReply {
        let offers: Vec<Offer> = self
            .offers
            .read()
            .map(|m| {
                m.values()
                    .filter(|o| o.timestamp >= since_ts)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        HistoryReply {
            offers,
            node_id: self.node_id.clone(),
        }
    }

    /// Handle one `Reconcile` push from a peer.
    pub fn reconcile(&self, source_node: &str, offers: Vec<Offer>) -> ReconcileAck {
        if !self.is_active() {
            return ReconcileAck {
                ok: false,
                new_count: 0,
            };
        }

        let new_count = self.merge(offers);
        if new_count > 0 {
            if let Err(error) = self.persist() {
                tracing::error!(node_id = %self.node_id, %error, "persistence failed");
            }
        }
        tracing::debug!(
            node_id = %self.node_id,
            source_node,
            new_count,
            "reconcile merged"
        );

        ReconcileAck {
            ok: true,
            new_count: new_count as u32,
        }
    }

    /// Union-insert offers, keeping existing entries; returns how many were
    /// previously absent.
    pub fn merge(&self, offers: Vec<Offer>) -> usize {
        let mut added = 0usize;
        if let Ok(mut map) = self.offers.write() {
            for offer in offers {
                if !map.contains_key(&offer.offer_id) {
                    map.insert(offer.offer_id.clone(), offer);
                    added += 1;
                }
            }
        }
        added
    }

    /// Copy of the full offer set, for gossip pushes.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Offer> {
        self.offers
            .read()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Rewrite the whole map to the persistence file.
    ///
    /// The document is written to a sibling temp file first and renamed
    /// into place, so a crash mid-write leaves the previous file intact.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when serialization or file I/O fails.
    pub fn persist(&self) -> Result<(), PersistError> {
        let document: HashMap<String, Offer> = self
            .offers
            .read()
            .map(|m| m.clone())
            .unwrap_or_default();

        let _guard = self.persist_guard.lock();
        let json = serde_json::to_vec_pretty(&document)?;
        let tmp = self.persist_path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.persist_path)?;
        Ok(())
    }

    /// Load the persistence file into the map, if it exists.
    ///
    /// A missing file means a fresh node and an empty map.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] when the file exists but cannot be read or
    /// parsed.
    pub fn load(&self) -> Result<usize, PersistError> {
        let bytes = match std::fs::read(&self.persist_path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(node_id = %self.node_id, "no previous persistence file");
                return Ok(0);
            }
            Err(error) => return Err(error.into()),
        };

        let document: HashMap<String, Offer> = serde_json::from_slice(&bytes)?;
        let count = document.len();
        if let Ok(mut map) = self.offers.write() {
            map.extend(document);
        }
        tracing::info!(node_id = %self.node_id, count, "offers loaded from disk");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cyberday_testing::offer;

    #[allow(clippy::expect_used)] // Panics: Test will fail if tempdir creation fails
    fn tempdir() -> tempfile::TempDir {
        tempfile::tempdir().expect("tempdir should be created")
    }

    #[test]
    fn store_inserts_and_acks() {
        let dir = tempdir();
        let store = NodeStore::new("DB1", dir.path());

        let ack = store.store(offer("A").build());
        assert!(ack.ok);
        assert_eq!(ack.node_id, "DB1");
        assert!(store.holds("A"));
    }

    #[test]
    fn store_overwrite_is_idempotent() {
        let dir = tempdir();
        let store = NodeStore::new("DB1", dir.path());

        store.store(offer("A").build());
        store.store(offer("A").build());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn down_node_refuses_stores_but_serves_reads() {
        let dir = tempdir();
        let store = NodeStore::new("DB1", dir.path());
        store.store(offer("A").build());

        store.set_active(false);
        let ack = store.store(offer("B").build());
        assert!(!ack.ok);
        assert_eq!(ack.message, NODE_INACTIVE);
        assert!(!store.holds("B"));

        // Reads stay available through the outage.
        assert_eq!(store.read_all(0).offers.len(), 1);
    }

    #[test]
    fn read_all_filters_by_timestamp() {
        let dir = tempdir();
        let store = NodeStore::new("DB1", dir.path());
        store.store(offer("old").timestamp(100).build());
        store.store(offer("new").timestamp(200).build());

        let reply = store.read_all(150);
        assert_eq!(reply.offers.len(), 1);
        assert_eq!(reply.offers[0].offer_id, "new");

        assert_eq!(store.read_all(0).offers.len(), 2);
    }

    #[test]
    fn reconcile_inserts_only_absent_offers() {
        let dir = tempdir();
        let store = NodeStore::new("DB1", dir.path());
        store.store(offer("A").build());

        let ack = store.reconcile("DB2", vec![offer("A").build(), offer("B").build()]);
        assert!(ack.ok);
        assert_eq!(ack.new_count, 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn reconcile_refused_while_down() {
        let dir = tempdir();
        let store = NodeStore::new("DB1", dir.path());
        store.set_active(false);

        let ack = store.reconcile("DB2", vec![offer("A").build()]);
        assert!(!ack.ok);
        assert!(store.is_empty());
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail on persistence errors
    fn persistence_roundtrip_across_restart() {
        let dir = tempdir();
        {
            let store = NodeStore::new("DB1", dir.path());
            store.store(offer("A").build());
            store.store(offer("B").build());
        }

        let reborn = NodeStore::new("DB1", dir.path());
        let loaded = reborn.load().expect("load should succeed");
        assert_eq!(loaded, 2);
        assert!(reborn.holds("A"));
        assert!(reborn.holds("B"));
    }

    #[test]
    #[allow(clippy::expect_used)] // Panics: Test will fail on persistence errors
    fn missing_file_loads_empty() {
        let dir = tempdir();
        let store = NodeStore::new("DB1", dir.path());
        assert_eq!(store.load().expect("load should succeed"), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn persistence_file_name_is_the_contract() {
        let dir = tempdir();
        let store = NodeStore::new("DB2", dir.path());
        assert!(store
            .persist_path()
            .ends_with("DB2_ofertas.json"));
    }
}
