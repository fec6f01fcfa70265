// tests/api_http.rs
//
// HTTP-level tests for the relay Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /trigger (queued / queue closed)
// - GET /subscribers/count
// - GET /metrics

use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::ServiceExt as _; // for `oneshot`

use market_news_relay::api::{self, AppState};
use market_news_relay::ingest::scheduler::trigger_channel;
use market_news_relay::metrics::Metrics;
use market_news_relay::subscribers::SubscriberStore;
use market_news_relay::Trigger;

const BODY_LIMIT: usize = 1024 * 1024;

fn state_with(dir: &Path, ids: &[i64]) -> (AppState, mpsc::Receiver<Trigger>) {
    let path = dir.join("subs.json");
    std::fs::write(&path, serde_json::to_string(ids).unwrap()).unwrap();
    let (triggers, rx) = trigger_channel(4);
    let state = AppState {
        triggers,
        subscribers: Arc::new(SubscriberStore::load(path)),
    };
    (state, rx)
}

fn test_router(state: AppState) -> Router {
    api::router(state, &Metrics::detached())
}

async fn body_string(resp: shuttle_axum::axum::response::Response) -> String {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    String::from_utf8(bytes).expect("utf8")
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _rx) = state_with(dir.path(), &[]);

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = test_router(state).oneshot(req).await.expect("oneshot /health");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await.trim(), "OK");
}

#[tokio::test]
async fn trigger_enqueues_a_pass_for_everyone() {
    let dir = tempfile::tempdir().unwrap();
    let (state, mut rx) = state_with(dir.path(), &[1, 2]);

    let req = Request::builder()
        .method("POST")
        .uri("/trigger")
        .body(Body::empty())
        .expect("build POST /trigger");
    let resp = test_router(state).oneshot(req).await.expect("oneshot /trigger");

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let v: Json = serde_json::from_str(&body_string(resp).await).expect("json body");
    assert_eq!(v["queued"], true);
    assert_eq!(rx.try_recv().ok(), Some(Trigger::All));
}

#[tokio::test]
async fn trigger_reports_unavailable_once_scheduler_is_gone() {
    let dir = tempfile::tempdir().unwrap();
    let (state, rx) = state_with(dir.path(), &[1]);
    drop(rx);

    let req = Request::builder()
        .method("POST")
        .uri("/trigger")
        .body(Body::empty())
        .expect("build POST /trigger");
    let resp = test_router(state).oneshot(req).await.expect("oneshot /trigger");

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let v: Json = serde_json::from_str(&body_string(resp).await).expect("json body");
    assert_eq!(v["queued"], false);
}

#[tokio::test]
async fn subscriber_count_reflects_store() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _rx) = state_with(dir.path(), &[10, 20, 30]);

    let req = Request::builder()
        .method("GET")
        .uri("/subscribers/count")
        .body(Body::empty())
        .expect("build GET /subscribers/count");
    let resp = test_router(state).oneshot(req).await.expect("oneshot count");

    assert_eq!(resp.status(), StatusCode::OK);
    let v: Json = serde_json::from_str(&body_string(resp).await).expect("json body");
    assert_eq!(v["count"], 3);
}

#[tokio::test]
async fn metrics_endpoint_is_mounted() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _rx) = state_with(dir.path(), &[]);

    let req = Request::builder()
        .method("GET")
        .uri("/metrics")
        .body(Body::empty())
        .expect("build GET /metrics");
    let resp = test_router(state).oneshot(req).await.expect("oneshot /metrics");

    assert_eq!(resp.status(), StatusCode::OK);
}
