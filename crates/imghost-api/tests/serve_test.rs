//! Serving, health, and middleware integration tests.
//!
//! Run with: `cargo test -p imghost-api --test serve_test`

mod helpers;

use helpers::fixtures::{clean_verdict, create_minimal_png, create_test_jpeg};
use helpers::{image_form, setup_test_app, StubClassifier, StubOutcome};
use imghost_api::REQUEST_ID_HEADER;
use serde_json::Value;

#[tokio::test]
async fn test_uploaded_image_is_served_by_url() {
    let app = setup_test_app(StubClassifier::new(StubOutcome::Verdict(clean_verdict()))).await;
    let data = create_minimal_png();

    let uploaded: Value = app
        .client()
        .post("/api/upload")
        .multipart(image_form("pixel.png", "image/png", data.clone()))
        .await
        .json();
    let url = uploaded["data"]["url"].as_str().unwrap();
    let path = url.strip_prefix(app.config.public_base_url()).unwrap();
    assert!(path.starts_with("/img/"));

    let response = app.client().get(path).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "image/png");
    assert!(response
        .header("cache-control")
        .to_str()
        .unwrap()
        .contains("immutable"));
    assert_eq!(response.as_bytes().as_ref(), data.as_slice());
}

#[tokio::test]
async fn test_timestamp_segment_is_not_checked() {
    let app = setup_test_app(StubClassifier::new(StubOutcome::Verdict(clean_verdict()))).await;
    let data = create_test_jpeg(42);

    let uploaded: Value = app
        .client()
        .post("/api/upload")
        .multipart(image_form("cat.jpeg", "image/jpeg", data.clone()))
        .await
        .json();
    let digest = uploaded["data"]["digest"].as_str().unwrap();

    let response = app.client().get(&format!("/img/0/{}", digest)).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "image/jpeg");
}

#[tokio::test]
async fn test_unknown_digest_not_found() {
    let app = setup_test_app(StubClassifier::new(StubOutcome::Verdict(clean_verdict()))).await;

    let missing = app.client().get(&format!("/img/1/{}", "a".repeat(64))).await;
    assert_eq!(missing.status_code(), 404);
    let body: Value = missing.json();
    assert_eq!(body["code"], "NOT_FOUND");

    let malformed = app.client().get("/img/1/not-a-digest").await;
    assert_eq!(malformed.status_code(), 404);

    let traversal = app.client().get("/img/1/..%2F..%2Fetc%2Fpasswd").await;
    assert_eq!(traversal.status_code(), 404);
}

#[tokio::test]
async fn test_liveness() {
    let app = setup_test_app(StubClassifier::new(StubOutcome::Unavailable)).await;

    let response = app.client().get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_readiness_follows_classifier() {
    let ready = setup_test_app(StubClassifier::new(StubOutcome::Verdict(clean_verdict()))).await;
    let response = ready.client().get("/health/ready").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["storage"], "healthy");

    let not_ready = setup_test_app(StubClassifier::new(StubOutcome::Unavailable)).await;
    let response = not_ready.client().get("/health/ready").await;
    assert_eq!(response.status_code(), 503);
    let body: Value = response.json();
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["storage"], "healthy");
    assert!(body["classifier"].as_str().unwrap().starts_with("unhealthy"));
}

#[tokio::test]
async fn test_every_response_has_request_id() {
    let app = setup_test_app(StubClassifier::new(StubOutcome::Verdict(clean_verdict()))).await;

    let generated = app.client().get("/health").await;
    assert!(!generated
        .header(REQUEST_ID_HEADER)
        .to_str()
        .unwrap()
        .is_empty());

    let propagated = app
        .client()
        .get("/img/1/unknown")
        .add_header(REQUEST_ID_HEADER, "req-123")
        .await;
    assert_eq!(propagated.status_code(), 404);
    assert_eq!(propagated.header(REQUEST_ID_HEADER), "req-123");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = setup_test_app(StubClassifier::new(StubOutcome::Verdict(clean_verdict()))).await;

    let response = app.client().get("/api/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["paths"]["/api/upload"]["post"].is_object());
}
