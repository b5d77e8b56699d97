mod common;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clinic::config::FlagsConfig;
use clinic::flags::{self, FeatureFlagProvider, FileFlags, REMINDERS_ENABLED, RemoteFlags};

fn flag_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn file_flags(file: &NamedTempFile) -> FileFlags {
    FileFlags::new(Some(file.path().to_path_buf()))
}

// ============================================================================
// File provider
// ============================================================================

#[tokio::test]
async fn test_file_flags_read_booleans() {
    let file = flag_file(r#"{"appointments.reminders.enabled": true, "beta.ui": false, "label": "x", "count": 3}"#);
    let flags = file_flags(&file);

    assert!(flags.check(REMINDERS_ENABLED).await);
    assert!(!flags.check("beta.ui").await);
    assert!(!flags.check("unknown").await);

    let snapshot = flags.snapshot().await;
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get("beta.ui"), Some(&false));
    assert!(!snapshot.contains_key("label"));
}

#[tokio::test]
async fn test_file_flags_pick_up_edits() {
    let file = flag_file(r#"{"beta.ui": false}"#);
    let flags = file_flags(&file);
    assert!(!flags.check("beta.ui").await);

    std::fs::write(file.path(), r#"{"beta.ui": true}"#).unwrap();
    assert!(flags.check("beta.ui").await);
}

#[tokio::test]
async fn test_file_flags_missing_or_invalid_file_is_empty() {
    let missing = FileFlags::new(Some(PathBuf::from("/nonexistent/clinic/flags.json")));
    assert!(missing.snapshot().await.is_empty());
    assert!(!missing.check(REMINDERS_ENABLED).await);

    let file = flag_file("[true, false]");
    assert!(file_flags(&file).snapshot().await.is_empty());

    let unset = FileFlags::new(None);
    assert!(unset.snapshot().await.is_empty());
}

// ============================================================================
// Remote provider
// ============================================================================

#[tokio::test]
async fn test_remote_flag_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/flags/{REMINDERS_ENABLED}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": true })))
        .mount(&server)
        .await;

    let flags = RemoteFlags::new(&format!("{}/flags", server.uri()), None).unwrap();
    assert!(flags.check(REMINDERS_ENABLED).await);
}

#[tokio::test]
async fn test_remote_unknown_flag_is_off() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    // A 404 is an answer, not an outage: the fallback file is not consulted.
    let file = flag_file(r#"{"beta.ui": true}"#);
    let flags = RemoteFlags::new(&format!("{}/flags", server.uri()), Some(file_flags(&file))).unwrap();
    assert!(!flags.check("beta.ui").await);
}

#[tokio::test]
async fn test_remote_failure_falls_back_to_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let file = flag_file(r#"{"beta.ui": true}"#);
    let flags = RemoteFlags::new(&format!("{}/flags", server.uri()), Some(file_flags(&file))).unwrap();
    assert!(flags.check("beta.ui").await);
    assert_eq!(flags.snapshot().await.get("beta.ui"), Some(&true));
}

#[tokio::test]
async fn test_remote_unreachable_without_fallback_is_off() {
    let flags = RemoteFlags::new("http://127.0.0.1:1/flags", None).unwrap();
    assert!(!flags.check(REMINDERS_ENABLED).await);
    assert!(flags.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_remote_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "appointments.reminders.enabled": true,
            "beta.ui": false,
            "note": "ignored",
        })))
        .mount(&server)
        .await;

    let flags = RemoteFlags::new(&format!("{}/flags", server.uri()), None).unwrap();
    let snapshot = flags.snapshot().await;
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get(REMINDERS_ENABLED), Some(&true));
}

#[test]
fn test_remote_rejects_bad_url() {
    assert!(RemoteFlags::new("not a url", None).is_err());
    assert!(RemoteFlags::new("mailto:flags@clinic.test", None).is_err());
}

#[test]
fn test_provider_selection() {
    let file_only = flags::from_config(&FlagsConfig::default()).unwrap();
    assert_eq!(file_only.name(), "file");

    let remote = flags::from_config(&FlagsConfig {
        remote_url: Some("http://flags.internal:8500/v1/kv".to_string()),
        fallback_path: None,
    })
    .unwrap();
    assert_eq!(remote.name(), "remote");
}

// ============================================================================
// HTTP surface
// ============================================================================

#[tokio::test]
async fn test_feature_flags_endpoint() {
    let file = flag_file(r#"{"appointments.reminders.enabled": true, "beta.ui": false}"#);
    let app = common::spawn_app_with_flags(Arc::new(file_flags(&file))).await;

    let resp = app
        .client
        .get(app.url("/api/feature-flags"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "appointments.reminders.enabled": true, "beta.ui": false })
    );
}

#[tokio::test]
async fn test_booking_consults_reminder_flag_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/flags/{REMINDERS_ENABLED}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": true })))
        .expect(1)
        .mount(&server)
        .await;

    let remote = RemoteFlags::new(&format!("{}/flags", server.uri()), None).unwrap();
    let app = common::spawn_app_with_flags(Arc::new(remote)).await;

    let token = app.admin_token().await;
    let patient = app.create_patient(&token, "Flag Patient").await;
    let doctor = app.create_doctor(&token, "Flag Doctor", "GP").await;
    let (patient_id, doctor_id) = (
        patient["id"].as_str().unwrap(),
        doctor["id"].as_str().unwrap(),
    );

    let (_, status) = app
        .book(&token, patient_id, doctor_id, "2030-01-01T09:00:00Z", "2030-01-01T09:30:00Z")
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // A rejected booking never reaches the reminder step.
    let (_, status) = app
        .book(&token, patient_id, doctor_id, "2030-01-01T09:00:00Z", "2030-01-01T09:30:00Z")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    server.verify().await;
}
