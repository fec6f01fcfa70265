use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::ingest::scheduler::{Trigger, TriggerHandle};
use crate::metrics::Metrics;
use crate::subscribers::SubscriberStore;

#[derive(Clone)]
pub struct AppState {
    pub triggers: TriggerHandle,
    pub subscribers: Arc<SubscriberStore>,
}

pub fn router(state: AppState, metrics: &Metrics) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/trigger", post(trigger_all))
        .route("/subscribers/count", get(subscriber_count))
        .with_state(state)
        .merge(metrics.router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
}

#[derive(serde::Serialize)]
struct TriggerResp {
    queued: bool,
}

/// Queue an on-demand pass for every subscriber.
async fn trigger_all(State(state): State<AppState>) -> (StatusCode, Json<TriggerResp>) {
    match state.triggers.request(Trigger::All).await {
        Ok(()) => (StatusCode::ACCEPTED, Json(TriggerResp { queued: true })),
        Err(e) => {
            tracing::warn!("trigger rejected: {e:#}");
            (StatusCode::SERVICE_UNAVAILABLE, Json(TriggerResp { queued: false }))
        }
    }
}

#[derive(serde::Serialize)]
struct CountResp {
    count: usize,
}

async fn subscriber_count(State(state): State<AppState>) -> Json<CountResp> {
    Json(CountResp {
        count: state.subscribers.len(),
    })
}
