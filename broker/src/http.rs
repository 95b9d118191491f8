//! The broker's HTTP surface.
//!
//! Three POST endpoints over a shared [`Broker`]:
//!
//! - `POST /v1/offers` — `SubmitOffer`
//! - `POST /v1/consumers` — `RegisterConsumer`
//! - `POST /v1/history` — `FetchHistory`
//!
//! Replies are always `200` with a data ack in the body; rejection reasons
//! travel inside the ack, so producers can tell a bad offer from a broken
//! network.

use crate::dispatcher::Broker;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use cyberday_core::wire::{
    FetchHistoryRequest, HistoryReply, OfferAck, RegisterAck, RegisterConsumerRequest,
};
use cyberday_core::Offer;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the broker router.
pub fn router(broker: Arc<Broker>) -> Router {
    Router::new()
        .route("/v1/offers", post(submit_offer))
        .route("/v1/consumers", post(register_consumer))
        .route("/v1/history", post(fetch_history))
        .layer(TraceLayer::new_for_http())
        .with_state(broker)
}

async fn submit_offer(
    State(broker): State<Arc<Broker>>,
    Json(offer): Json<Offer>,
) -> Json<OfferAck> {
    Json(broker.submit_offer(offer).await)
}

async fn register_consumer(
    State(broker): State<Arc<Broker>>,
    Json(request): Json<RegisterConsumerRequest>,
) -> Json<RegisterAck> {
    Json(broker.register_consumer(&request))
}

async fn fetch_history(
    State(broker): State<Arc<Broker>>,
    Json(request): Json<FetchHistoryRequest>,
) -> Json<HistoryReply> {
    Json(broker.fetch_history(&request.consumer_id).await)
}
