//! Consumer configuration from the environment.

use crate::service::DisconnectSchedule;
use std::path::PathBuf;
use std::time::Duration;

/// The static consumer-id → listen-port table.
///
/// Twelve well-known consumers, four per category group. Unknown ids fall
/// back to the first port.
const PORTS: [(&str, u16); 12] = [
    ("C-E1", 50061),
    ("C-E2", 50062),
    ("C-E3", 50063),
    ("C-E4", 50064),
    ("C-M1", 50065),
    ("C-M2", 50066),
    ("C-M3", 50067),
    ("C-M4", 50068),
    ("C-H1", 50069),
    ("C-H2", 50070),
    ("C-H3", 50071),
    ("C-H4", 50072),
];

/// Port a consumer id listens on.
#[must_use]
pub fn port_for(consumer_id: &str) -> u16 {
    PORTS
        .iter()
        .find(|(id, _)| *id == consumer_id)
        .map_or(50061, |(_, port)| *port)
}

/// Consumer process configuration.
#[derive(Clone, Debug)]
pub struct ConsumerConfig {
    /// This consumer's identity.
    pub consumer_id: String,
    /// The shared preferences CSV.
    pub preferences_path: PathBuf,
    /// Broker address.
    pub broker_addr: String,
    /// Address this consumer listens on.
    pub listen_addr: String,
    /// Address the broker should push to (how peers reach us).
    pub advertise_addr: String,
    /// Directory the offer log is written in.
    pub log_dir: PathBuf,
    /// Optional simulated disconnection.
    pub disconnect: Option<DisconnectSchedule>,
}

impl ConsumerConfig {
    /// Read configuration from the environment.
    ///
    /// Recognized variables: `CONSUMIDOR_ID`, `ARCHIVO_CONFIG`,
    /// `BROKER_ADDR`, `CONSUMER_LISTEN`, `CONSUMER_ADDR`, `LOG_DIR`,
    /// `DISCONNECT_AFTER_SECS` + `DISCONNECT_FOR_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        let var = |name: &str, default: &str| {
            std::env::var(name).unwrap_or_else(|_| default.to_string())
        };

        let consumer_id = var("CONSUMIDOR_ID", "C-E1");
        let port = port_for(&consumer_id);

        let secs = |name: &str| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
        };
        let disconnect = match (secs("DISCONNECT_AFTER_SECS"), secs("DISCONNECT_FOR_SECS")) {
            (Some(after), Some(duration)) => Some(DisconnectSchedule { after, duration }),
            _ => None,
        };

        Self {
            preferences_path: PathBuf::from(var("ARCHIVO_CONFIG", "consumidores.csv")),
            broker_addr: var("BROKER_ADDR", "localhost:50051"),
            listen_addr: var("CONSUMER_LISTEN", &format!("0.0.0.0:{port}")),
            advertise_addr: var("CONSUMER_ADDR", &format!("localhost:{port}")),
            log_dir: PathBuf::from(var("LOG_DIR", ".")),
            disconnect,
            consumer_id,
        }
    }
}
