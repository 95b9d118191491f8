//! Broker configuration from the environment.

use std::path::PathBuf;

/// Broker process configuration.
///
/// Everything comes from environment variables with fixed defaults, so the
/// binary runs unconfigured on a developer machine and fully addressed
/// inside a compose file.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    /// Address the broker listens on.
    pub listen_addr: String,
    /// The static cluster: `(node_id, address)` in declaration order.
    pub nodes: Vec<(String, String)>,
    /// Where the shutdown report is written.
    pub report_path: PathBuf,
}

impl BrokerConfig {
    /// Read configuration from the environment.
    ///
    /// Recognized variables: `BROKER_LISTEN`, `DB1_ADDR`, `DB2_ADDR`,
    /// `DB3_ADDR`, `REPORTE`.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };

        Self {
            listen_addr: var("BROKER_LISTEN", "0.0.0.0:50051"),
            nodes: vec![
                ("DB1".to_string(), var("DB1_ADDR", "localhost:50052")),
                ("DB2".to_string(), var("DB2_ADDR", "localhost:50053")),
                ("DB3".to_string(), var("DB3_ADDR", "localhost:50054")),
            ],
            report_path: PathBuf::from(var("REPORTE", "Reporte.txt")),
        }
    }
}
