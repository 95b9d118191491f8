//! Broker entry point: wire the cluster clients, serve the HTTP surface,
//! and write the report on shutdown.

use anyhow::Context;
use cyberday_broker::{config::BrokerConfig, http, report, Broker, Cluster};
use cyberday_core::{ConsumerClient, StorageNodeClient};
use cyberday_transport::{Deadlines, HttpConsumerClient, HttpStorageNodeClient};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = BrokerConfig::from_env();
    let deadlines = Deadlines::default();

    let clients: Vec<Arc<dyn StorageNodeClient>> = config
        .nodes
        .iter()
        .map(|(node_id, addr)| {
            Arc::new(HttpStorageNodeClient::new(node_id.clone(), addr, deadlines))
                as Arc<dyn StorageNodeClient>
        })
        .collect();

    let connect = Arc::new(move |addr: &str| {
        Arc::new(HttpConsumerClient::new(addr, deadlines)) as Arc<dyn ConsumerClient>
    });

    let broker = Arc::new(Broker::new(Cluster::new(clients), connect));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "broker listening");

    let app = http::router(Arc::clone(&broker));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("broker server failed")?;

    report::write_to(&broker, &config.report_path)
        .with_context(|| format!("failed to write {}", config.report_path.display()))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
