//! HTTP surface tests, driven through the router without a listener.

#![allow(clippy::expect_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use fleet_common::ExecutionStats;
use fleet_manager::api::{AppState, DestroyResponse, ErrorResponse, create_router};
use fleet_manager::infra::MetricsRegistry;
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::mocks::{AgentBehavior, FakePool, Fixture, MemoryOwnerStore, STAGE};

fn app(fx: &Fixture) -> axum::Router {
    let metrics = Arc::new(MetricsRegistry::new().expect("metrics"));
    create_router(AppState::new(fx.service(), metrics))
}

async fn post_destroy(router: axum::Router, body: &str) -> (StatusCode, Vec<u8>) {
    let resp = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/destroy")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    let status = resp.status();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec();
    (status, bytes)
}

#[tokio::test]
async fn destroy_returns_200_on_success() {
    let fx = Fixture::provisioned(AgentBehavior::Respond(None));
    let (status, body) = post_destroy(
        app(&fx),
        r#"{"pool_id":"linux-amd64","stage_runtime_id":"stage-1"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let resp: DestroyResponse = serde_json::from_slice(&body).expect("json");
    assert_eq!(resp.status, "destroyed");
    assert!(fx.stages.get(STAGE).is_none());
}

#[tokio::test]
async fn missing_stage_id_returns_400() {
    let fx = Fixture::provisioned(AgentBehavior::Respond(None));
    let (status, body) = post_destroy(app(&fx), r#"{"pool_id":"linux-amd64"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let resp: ErrorResponse = serde_json::from_slice(&body).expect("json");
    assert!(resp.error.contains("stage_runtime_id"));
    assert_eq!(fx.owners.find_calls(), 0);
}

#[tokio::test]
async fn exhausted_destroy_returns_500() {
    let fx = Fixture::build(
        MemoryOwnerStore::default(),
        |_| FakePool::default(),
        AgentBehavior::Respond(None),
    );
    let (status, body) = post_destroy(app(&fx), r#"{"stage_runtime_id":"stage-1"}"#).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let resp: ErrorResponse = serde_json::from_slice(&body).expect("json");
    assert!(
        resp.error
            .contains("failed to find stage owner entity for stage: stage-1"),
        "unexpected error body: {}",
        resp.error
    );
}

#[tokio::test]
async fn health_returns_200() {
    let fx = Fixture::provisioned(AgentBehavior::Respond(None));
    let resp = app(&fx)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn metrics_exports_prometheus_text() {
    let fx = Fixture::provisioned(AgentBehavior::Respond(None));
    let resp = app(&fx)
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    assert_eq!(content_type.as_deref(), Some("text/plain; version=0.0.4"));
}

#[tokio::test]
async fn destroy_usage_reaches_metrics_endpoint() {
    let fx = Fixture::provisioned(AgentBehavior::Respond(Some(ExecutionStats {
        total_mem_mb: 4096.0,
        cpu_cores: 2,
        avg_mem_usage_pct: 20.0,
        avg_cpu_usage_pct: 30.0,
        max_mem_usage_pct: 40.0,
        max_cpu_usage_pct: 60.0,
    })));
    let registry = Arc::new(MetricsRegistry::new().expect("metrics"));
    let router = create_router(AppState::new(
        fx.service_reporting_to(registry.sink()),
        Arc::clone(&registry),
    ));

    let (status, _) = post_destroy(
        router.clone(),
        r#"{"pool_id":"linux-amd64","stage_runtime_id":"stage-1"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let resp = router
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let text = String::from_utf8(bytes.to_vec()).expect("utf8");

    for family in [
        "fleet_cpu_usage_percentile_count",
        "fleet_memory_usage_percentile_count",
    ] {
        let line = text
            .lines()
            .find(|l| l.starts_with(family))
            .unwrap_or_else(|| panic!("{family} missing from:\n{text}"));
        assert!(line.contains(r#"pool_id="linux-amd64""#), "{line}");
        assert!(line.ends_with(" 1"), "{line}");
    }
}
