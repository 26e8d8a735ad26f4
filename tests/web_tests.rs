//! HTTP API tests driving the router directly, without binding a socket.

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use trial_matcher::extract::keyword::KeywordExtractor;
use trial_matcher::extract::{CodeExtractor, ExtractError};
use trial_matcher::web::server::{create_router, AppState, MAX_REQUEST_BODY_SIZE};
use trial_matcher::{CodeSet, InMemoryStore, MatchingConfig};

fn embedded_state(config: MatchingConfig) -> Arc<AppState> {
    Arc::new(AppState {
        store: InMemoryStore::load_embedded().expect("embedded store"),
        extractor: Arc::new(KeywordExtractor::load_embedded().expect("embedded lexicon")),
        config,
    })
}

async fn send(state: Arc<AppState>, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = create_router(state)
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn post_match(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/match")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

#[tokio::test]
async fn test_match_by_codes() {
    let state = embedded_state(MatchingConfig::default());
    let (status, json) = send(state, post_match(r#"{"codes": ["C50.911", "I10"]}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ranked");
    assert_eq!(json["query"]["families"], serde_json::json!(["C50", "I10"]));
    let matches = json["matches"].as_array().expect("matches array");
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["nct_id"], "NCT90000001");
    assert_eq!(matches[0]["score"], 10);
}

#[tokio::test]
async fn test_match_by_description_with_alert() {
    let state = embedded_state(MatchingConfig::default());
    let (status, json) = send(
        state,
        post_match(r#"{"description": "breast cancer, prior heart failure admission"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let first = &json["matches"][0];
    assert_eq!(first["nct_id"], "NCT90000001");
    assert_eq!(first["score"], -90);
    let alert = first["alerts"][0].as_str().expect("alert string");
    assert!(alert.starts_with("Excludes I50: "));
    assert!(alert.ends_with("..."));
}

#[tokio::test]
async fn test_match_reports_no_identifiable_codes() {
    let state = embedded_state(MatchingConfig::default());
    let (status, json) = send(state, post_match(r#"{"description": "no complaints"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "no_identifiable_codes");
    assert_eq!(json["matches"], serde_json::json!([]));
}

#[tokio::test]
async fn test_match_input_errors_are_bad_request() {
    for body in [
        r#"{"description": "   "}"#,
        "{}",
        r#"{"codes": ["C50'; --"]}"#,
        r#"{"codes": ["C50"], "limit": 0}"#,
    ] {
        let state = embedded_state(MatchingConfig::default());
        let (status, json) = send(state, post_match(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(json["error_type"], "invalid_input");
        assert!(json["details"].is_null());
    }
}

#[tokio::test]
async fn test_match_limit_is_applied() {
    let state = embedded_state(MatchingConfig::default());
    let (_, json) = send(state, post_match(r#"{"codes": ["C50", "I10"], "limit": 1}"#)).await;

    assert_eq!(json["matches"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["processing_info"]["configuration"]["result_limit"], 1);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let state = embedded_state(MatchingConfig::default());
    let description = "a".repeat(MAX_REQUEST_BODY_SIZE + 1);
    let body = serde_json::json!({ "description": description }).to_string();
    let (status, _) = send(state, post_match(&body)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

struct StalledExtractor;

#[async_trait]
impl CodeExtractor for StalledExtractor {
    async fn extract(&self, _text: &str) -> Result<CodeSet, ExtractError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(CodeSet::new())
    }
}

#[tokio::test]
async fn test_extractor_timeout_is_gateway_timeout() {
    let state = Arc::new(AppState {
        store: InMemoryStore::load_embedded().expect("embedded store"),
        extractor: Arc::new(StalledExtractor),
        config: MatchingConfig {
            extractor_timeout_ms: 20,
            ..Default::default()
        },
    });
    let (status, json) = send(state, post_match(r#"{"description": "asthma"}"#)).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json["error_type"], "timeout");
    assert!(json["details"].is_null());
}

#[tokio::test]
async fn test_trials_endpoints() {
    let state = embedded_state(MatchingConfig::default());

    let (status, json) = send(state.clone(), get("/api/trials")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 5);

    let (status, json) = send(state.clone(), get("/api/trials/NCT90000002")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["nct_id"], "NCT90000002");
    assert_eq!(json["criteria"].as_array().map(Vec::len), Some(4));

    let (status, json) = send(state, get("/api/trials/NCT00000000")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_type"], "not_found");
}

#[tokio::test]
async fn test_stats_endpoint() {
    let state = embedded_state(MatchingConfig::default());
    let (status, json) = send(state, get("/api/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["trial_count"], 5);
    assert_eq!(json["condition_total"], 10);
    assert_eq!(json["coding_coverage"], 1.0);
}

#[tokio::test]
async fn test_security_headers_present() {
    let state = embedded_state(MatchingConfig::default());
    let response = create_router(state)
        .oneshot(get("/api/stats"))
        .await
        .expect("router is infallible");

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["cache-control"], "no-store");
}
