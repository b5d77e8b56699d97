mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use tower::ServiceExt;

use clinic::clock::FixedClock;
use clinic::config::Config;
use clinic::db::MemoryStore;
use clinic::flags::FileFlags;
use clinic::state::AppState;

fn router(config: Config) -> Router {
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(FileFlags::new(None)),
        Arc::new(FixedClock::new(common::frozen_now())),
        config,
    );
    clinic::build_app(state)
}

fn json_post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn error_body(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let app = router(common::test_config());
    let resp = app
        .oneshot(Request::get("/api/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert_eq!(
        resp.headers()["referrer-policy"],
        "strict-origin-when-cross-origin"
    );
}

#[tokio::test]
async fn test_cors_preflight_for_configured_origin() {
    let mut config = common::test_config();
    config.cors_origin = Some("https://app.clinic.test".to_string());
    let app = router(config);

    let resp = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/appointments")
                .header(header::ORIGIN, "https://app.clinic.test")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.clinic.test"
    );
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let mut config = common::test_config();
    config.max_body_size = 1024;
    let app = router(config);

    let padding = "x".repeat(4096);
    let body = format!(r#"{{"username":"{padding}","email":"a@x.com","password":"secret1"}}"#);
    let resp = app
        .oneshot(json_post("/api/auth/register", body))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = error_body(resp).await;
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = router(common::test_config());
    let resp = app
        .oneshot(json_post("/api/auth/token", r#"{"username": "alice""#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = error_body(resp).await;
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn test_missing_field_is_json_bad_request() {
    let app = router(common::test_config());
    let resp = app
        .oneshot(json_post(
            "/api/auth/register",
            r#"{"username":"alice","password":"secret1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/json"
    );
    let body = error_body(resp).await;
    assert!(body["error"].as_str().unwrap().contains("email"), "{body}");
}

#[tokio::test]
async fn test_missing_content_type_is_json_bad_request() {
    let app = router(common::test_config());
    let resp = app
        .oneshot(
            Request::post("/api/auth/token")
                .body(Body::from(r#"{"username":"a","password":"b"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = error_body(resp).await;
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn test_errors_are_json_objects() {
    let app = router(common::test_config());
    let resp = app
        .oneshot(json_post(
            "/api/auth/token",
            r#"{"username":"ghost","password":"nope"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body = error_body(resp).await;
    assert_eq!(body, serde_json::json!({ "error": "Invalid username or password" }));
}
