//! The consumer's HTTP surface: the single push endpoint.

use crate::service::ConsumerService;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use cyberday_core::wire::DeliverAck;
use cyberday_core::Offer;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the consumer router.
pub fn router(service: Arc<ConsumerService>) -> Router {
    Router::new()
        .route("/v1/deliver", post(deliver))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn deliver(
    State(service): State<Arc<ConsumerService>>,
    Json(offer): Json<Offer>,
) -> Json<DeliverAck> {
    Json(service.deliver(offer))
}
