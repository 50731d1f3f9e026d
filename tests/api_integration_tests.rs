//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint against the
//! in-memory store.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use prefix_cache::{api::create_router, AppState, Cache, CacheConfig, MemoryBackend, ServerConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_test_app_with_ttl(Duration::from_secs(60))
}

fn create_test_app_with_ttl(ttl: Duration) -> Router {
    let cache = Cache::new(Arc::new(MemoryBackend::new()), CacheConfig::new(ttl));
    create_router(AppState::new(cache))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn session_key(id: &str) -> Value {
    json!([{"atom": "session"}, {"str": id}])
}

// == PUT Endpoint Tests ==

#[tokio::test]
async fn test_put_endpoint_success() {
    let response = create_test_app()
        .oneshot(json_request(
            "PUT",
            "/put",
            json!({"key": session_key("abc"), "value": {"user": 1}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("stored"));
    assert_eq!(json["key"], session_key("abc"));
}

#[tokio::test]
async fn test_put_endpoint_empty_key() {
    let response = create_test_app()
        .oneshot(json_request("PUT", "/put", json!({"key": [], "value": 1})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_put_endpoint_malformed_json() {
    let response = create_test_app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/put")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_put_endpoint_without_ttl() {
    let cache = Cache::new(Arc::new(MemoryBackend::new()), CacheConfig::default());
    let app = create_router(AppState::new(cache));

    let response = app
        .oneshot(json_request(
            "PUT",
            "/put",
            json!({"key": session_key("abc"), "value": 1}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("ttl"));
}

#[tokio::test]
async fn test_put_endpoint_with_out_of_range_ttl() {
    let config = ServerConfig {
        ttl_ms: u64::MAX,
        ..ServerConfig::default()
    };
    let app = create_router(AppState::from_config(&config, Arc::new(MemoryBackend::new())));

    let response = app
        .oneshot(json_request(
            "PUT",
            "/put",
            json!({"key": session_key("abc"), "value": 1}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("out of range"));
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app();

    let put_response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/put",
            json!({"key": session_key("abc"), "value": {"user": 1}}),
        ))
        .await
        .unwrap();
    assert_eq!(put_response.status(), StatusCode::OK);

    let get_response = app
        .oneshot(json_request("POST", "/get", json!({"key": session_key("abc")})))
        .await
        .unwrap();

    assert_eq!(get_response.status(), StatusCode::OK);
    let json = body_to_json(get_response.into_body()).await;
    assert_eq!(json["key"], session_key("abc"));
    assert_eq!(json["value"], json!({"user": 1}));
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let response = create_test_app()
        .oneshot(json_request("POST", "/get", json!({"key": session_key("nope")})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_endpoint_after_expiry() {
    let app = create_test_app_with_ttl(Duration::from_millis(50));

    app.clone()
        .oneshot(json_request(
            "PUT",
            "/put",
            json!({"key": session_key("short"), "value": 1}),
        ))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = app
        .oneshot(json_request("POST", "/get", json!({"key": session_key("short")})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == ALL Endpoint Tests ==

#[tokio::test]
async fn test_all_endpoint_session_scenario() {
    let app = create_test_app();

    app.clone()
        .oneshot(json_request(
            "PUT",
            "/put",
            json!({"key": session_key("abc"), "value": {"user": 1}}),
        ))
        .await
        .unwrap();

    let pattern = json!({"pattern": [{"atom": "session"}, null]});
    let response = app
        .clone()
        .oneshot(json_request("POST", "/all", pattern.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["entries"][0]["key"], session_key("abc"));
    assert_eq!(json["entries"][0]["value"], json!({"user": 1}));

    let delete_response = app
        .clone()
        .oneshot(json_request("POST", "/delete", json!({"key": session_key("abc")})))
        .await
        .unwrap();
    assert_eq!(delete_response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request("POST", "/all", pattern))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"], 0);
    assert_eq!(json["entries"], json!([]));
}

#[tokio::test]
async fn test_all_endpoint_empty_pattern() {
    let response = create_test_app()
        .oneshot(json_request("POST", "/all", json!({"pattern": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_missing_key_is_ok() {
    let response = create_test_app()
        .oneshot(json_request("POST", "/delete", json!({"key": session_key("none")})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("deleted"));
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let response = create_test_app()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["backend"], "memory");
    assert!(json.get("timestamp").is_some());
}
