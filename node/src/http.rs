//! The storage node's HTTP surface.
//!
//! - `POST /v1/store` — persist one offer
//! - `POST /v1/read_all` — serve the local set
//! - `POST /v1/reconcile` — merge a peer's anti-entropy push

use crate::store::NodeStore;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use cyberday_core::wire::{
    HistoryReply, ReadAllRequest, ReconcileAck, ReconcileRequest, StoreAck,
};
use cyberday_core::Offer;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the node router.
pub fn router(store: Arc<NodeStore>) -> Router {
    Router::new()
        .route("/v1/store", post(store_offer))
        .route("/v1/read_all", post(read_all))
        .route("/v1/reconcile", post(reconcile))
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

async fn store_offer(
    State(store): State<Arc<NodeStore>>,
    Json(offer): Json<Offer>,
) -> Json<StoreAck> {
    Json(store.store(offer))
}

async fn read_all(
    State(store): State<Arc<NodeStore>>,
    Json(request): Json<ReadAllRequest>,
) -> Json<HistoryReply> {
    Json(store.read_all(request.since_ts))
}

async fn reconcile(
    State(store): State<Arc<NodeStore>>,
    Json(request): Json<ReconcileRequest>,
) -> Json<ReconcileAck> {
    Json(store.reconcile(&request.source_node, request.offers))
}
