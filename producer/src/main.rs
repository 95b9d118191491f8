//! Producer entry point: load the catalog and stream it into the broker.

use anyhow::Context;
use cyberday_producer::{run_catalog, Catalog};
use cyberday_transport::{Deadlines, HttpBrokerClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Settle time before the first submission, letting the cluster come up.
const STARTUP_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let name = std::env::var("PRODUCTOR_NOMBRE").unwrap_or_else(|_| "Riploy".to_string());
    let catalog_path = std::env::var("CATALOGO")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(format!("{}_catalogo.csv", name.to_lowercase())));
    let broker_addr = std::env::var("BROKER_ADDR").unwrap_or_else(|_| "localhost:50051".to_string());

    tracing::info!(producer = %name, catalog = %catalog_path.display(), "producer starting");

    let catalog = Catalog::load(&catalog_path)
        .with_context(|| format!("failed to load catalog {}", catalog_path.display()))?;
    let broker = Arc::new(HttpBrokerClient::new(&broker_addr, Deadlines::default()));

    tokio::time::sleep(STARTUP_DELAY).await;

    let summary = run_catalog(broker, &catalog, &name).await;
    tracing::info!(
        producer = %name,
        attempted = summary.attempted,
        accepted = summary.accepted,
        rejected = summary.rejected,
        "all catalog offers processed"
    );
    Ok(())
}
