//! Storage node entry point: load the persisted map, start gossip and any
//! scheduled outage, and serve the node surface.

use anyhow::Context;
use cyberday_node::{config::NodeConfig, gossip, http, outage, NodeStore};
use cyberday_core::StorageNodeClient;
use cyberday_transport::{Deadlines, HttpStorageNodeClient};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = NodeConfig::from_env();
    let store = Arc::new(NodeStore::new(&config.node_id, &config.data_dir));
    if let Err(error) = store.load() {
        // A corrupt file is an accepted limitation of whole-file rewrites;
        // start empty and let gossip repopulate.
        tracing::error!(%error, "failed to load persisted offers, starting empty");
    }

    let deadlines = Deadlines::default();
    let peers: Arc<[Arc<dyn StorageNodeClient>]> = config
        .peers
        .iter()
        .map(|(peer_id, addr)| {
            Arc::new(HttpStorageNodeClient::new(peer_id.clone(), addr, deadlines))
                as Arc<dyn StorageNodeClient>
        })
        .collect();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(gossip::run(
        Arc::clone(&store),
        Arc::clone(&peers),
        config.gossip_period,
        shutdown_rx,
    ));

    if let Some(schedule) = config.outage {
        tokio::spawn(outage::run(
            Arc::clone(&store),
            Arc::clone(&peers),
            schedule,
        ));
    }

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(
        node_id = %config.node_id,
        addr = %config.listen_addr,
        "storage node listening"
    );

    axum::serve(listener, http::router(Arc::clone(&store)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("node server failed")?;

    let _ = shutdown_tx.send(true);
    store.persist().context("final persistence failed")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
