//! Consumer entry point: load preferences, serve the push endpoint,
//! register with the broker, and optionally run a simulated disconnection.

use anyhow::Context;
use cyberday_consumer::{
    config::ConsumerConfig, http, log::OfferLog, preferences::Preferences, service,
    ConsumerService,
};
use cyberday_runtime::{retry_with_policy, RetryPolicy};
use cyberday_transport::{Deadlines, HttpBrokerClient};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ConsumerConfig::from_env();
    let preferences = Preferences::load(&config.preferences_path, &config.consumer_id)
        .with_context(|| {
            format!(
                "failed to load preferences for {} from {}",
                config.consumer_id,
                config.preferences_path.display()
            )
        })?;
    tracing::info!(
        consumer_id = %preferences.consumer_id,
        categories = ?preferences.categories,
        stores = ?preferences.stores,
        max_price = preferences.max_price,
        "preferences loaded"
    );

    let broker = Arc::new(HttpBrokerClient::new(&config.broker_addr, Deadlines::default()));
    let service = Arc::new(ConsumerService::new(
        preferences,
        config.advertise_addr.clone(),
        broker,
        OfferLog::new(&config.consumer_id, &config.log_dir),
    ));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(
        consumer_id = %config.consumer_id,
        addr = %config.listen_addr,
        "consumer listening"
    );

    let server = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            axum::serve(listener, http::router(service))
                .with_graceful_shutdown(shutdown_signal())
                .await
        })
    };

    // The broker may still be coming up; register on a fixed cadence.
    let policy = RetryPolicy::fixed(5, Duration::from_secs(3));
    retry_with_policy(policy, || service.register())
        .await
        .context("could not register with the broker")?;

    if let Some(schedule) = config.disconnect {
        tokio::spawn(service::run_disconnect_cycle(
            Arc::clone(&service),
            schedule,
        ));
    }

    server
        .await
        .context("consumer server task failed")?
        .context("consumer server failed")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}
