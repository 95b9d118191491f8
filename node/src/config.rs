//! Node configuration from the environment.

use crate::outage::OutageSchedule;
use std::path::PathBuf;
use std::time::Duration;

/// Storage node process configuration.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// This node's identity (`DB1`, `DB2`, `DB3`).
    pub node_id: String,
    /// Address the node listens on.
    pub listen_addr: String,
    /// Peer nodes: `(node_id, address)`, in declaration order.
    pub peers: Vec<(String, String)>,
    /// Directory the persistence file lives in.
    pub data_dir: PathBuf,
    /// Anti-entropy period.
    pub gossip_period: Duration,
    /// Optional scheduled outage for failure demonstrations.
    pub outage: Option<OutageSchedule>,
}

impl NodeConfig {
    /// Read configuration from the environment.
    ///
    /// Recognized variables: `NODE_ID`, `NODE_LISTEN`, `DB1_ADDR`,
    /// `DB2_ADDR`, `DB3_ADDR`, `DATA_DIR`, `GOSSIP_SECS`,
    /// `FAIL_AFTER_SECS` + `FAIL_FOR_SECS`.
    ///
    /// The peer list is the static three-node cluster minus this node; the
    /// default listen port follows the node id (50052, 50053, 50054).
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };

        let node_id = var("NODE_ID", "DB1");
        let default_listen = match node_id.as_str() {
            "DB2" => "0.0.0.0:50053",
            "DB3" => "0.0.0.0:50054",
            _ => "0.0.0.0:50052",
        };

        let all_nodes = [
            ("DB1".to_string(), var("DB1_ADDR", "localhost:50052")),
            ("DB2".to_string(), var("DB2_ADDR", "localhost:50053")),
            ("DB3".to_string(), var("DB3_ADDR", "localhost:50054")),
        ];
        let peers = all_nodes
            .into_iter()
            .filter(|(id, _)| *id != node_id)
            .collect();

        let secs = |name: &str| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
        };

        let outage = match (secs("FAIL_AFTER_SECS"), secs("FAIL_FOR_SECS")) {
            (Some(after), Some(duration)) => Some(OutageSchedule { after, duration }),
            _ => None,
        };

        Self {
            node_id,
            listen_addr: var("NODE_LISTEN", default_listen),
            peers,
            data_dir: PathBuf::from(var("DATA_DIR", ".")),
            gossip_period: secs("GOSSIP_SECS").unwrap_or(crate::gossip::DEFAULT_GOSSIP_PERIOD),
            outage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peers_exclude_self() {
        let config = NodeConfig::from_env();
        assert_eq!(config.peers.len(), 2);
        assert!(config.peers.iter().all(|(id, _)| *id != config.node_id));
    }
}
