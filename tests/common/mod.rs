#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{Value, json};

use clinic::clock::FixedClock;
use clinic::config::{Config, FlagsConfig, JwtConfig, StoreKind};
use clinic::db::{MemoryStore, Store};
use clinic::flags::{FeatureFlagProvider, FileFlags};
use clinic::state::{AppState, SharedState};

pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough-for-hs256";

/// A running test server backed by an in-memory store and a frozen clock.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: SharedState,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Send a request and decode the JSON body (`null` when there is none).
    pub async fn send(&self, req: RequestBuilder) -> (Value, StatusCode) {
        let resp = req.send().await.expect("request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> (Value, StatusCode) {
        let mut body = json!({ "username": username, "email": email, "password": password });
        if let Some(role) = role {
            body["role"] = json!(role);
        }
        self.send(self.client.post(self.url("/api/auth/register")).json(&body))
            .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (Value, StatusCode) {
        let body = json!({ "username": username, "password": password });
        self.send(self.client.post(self.url("/api/auth/token")).json(&body))
            .await
    }

    /// Register an admin account and return its token.
    pub async fn admin_token(&self) -> String {
        let (body, status) = self
            .register("admin", "admin@clinic.test", "password123", Some("Admin"))
            .await;
        assert_eq!(status, StatusCode::OK, "admin register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Register a regular account and return its token.
    pub async fn user_token(&self) -> String {
        let (body, status) = self
            .register("user", "user@clinic.test", "password123", None)
            .await;
        assert_eq!(status, StatusCode::OK, "user register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_patient(&self, token: &str, full_name: &str) -> Value {
        let email = format!("{}@patients.test", full_name.to_lowercase().replace(' ', "."));
        let (body, status) = self
            .post_auth(
                "/api/patients",
                token,
                &json!({ "fullName": full_name, "email": email, "dateOfBirth": "1980-05-17" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create patient failed: {body}");
        body
    }

    pub async fn create_doctor(&self, token: &str, full_name: &str, specialty: &str) -> Value {
        let email = format!("{}@doctors.test", full_name.to_lowercase().replace([' ', '.'], ""));
        let (body, status) = self
            .post_auth(
                "/api/doctors",
                token,
                &json!({ "fullName": full_name, "email": email, "specialty": specialty }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create doctor failed: {body}");
        body
    }

    /// Book an appointment, return (body, status).
    pub async fn book(
        &self,
        token: &str,
        patient_id: &str,
        provider_id: &str,
        starts_at: &str,
        ends_at: &str,
    ) -> (Value, StatusCode) {
        self.post_auth(
            "/api/appointments",
            token,
            &json!({
                "patientId": patient_id,
                "providerId": provider_id,
                "startsAtUtc": starts_at,
                "endsAtUtc": ends_at,
            }),
        )
        .await
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        self.send(self.client.get(self.url(path)).bearer_auth(token))
            .await
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        self.send(self.client.post(self.url(path)).bearer_auth(token).json(body))
            .await
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        self.send(self.client.put(self.url(path)).bearer_auth(token).json(body))
            .await
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        self.send(self.client.delete(self.url(path)).bearer_auth(token))
            .await
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        store: StoreKind::Memory,
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            issuer: "HealthTrack".to_string(),
            audience: "HealthTrack".to_string(),
        },
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        max_body_size: 65_536,
        // Lowest bcrypt cost keeps the suite fast; the production default is covered separately.
        bcrypt_cost: 4,
        cors_origin: None,
        log_level: "warn".to_string(),
        flags: FlagsConfig::default(),
    }
}

/// Whole-second "now", so token expiry lands exactly on `expiresAt`.
pub fn frozen_now() -> DateTime<Utc> {
    DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap()
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_flags(Arc::new(FileFlags::new(None))).await
}

pub async fn spawn_app_with_flags(flags: Arc<dyn FeatureFlagProvider>) -> TestApp {
    spawn_app_with(test_config(), flags).await
}

pub async fn spawn_app_with_secret(secret: &str) -> TestApp {
    let mut config = test_config();
    config.jwt.secret = secret.to_string();
    spawn_app_with(config, Arc::new(FileFlags::new(None))).await
}

pub async fn spawn_app_with_store(store: Arc<dyn Store>) -> TestApp {
    spawn_app_on(store, test_config(), Arc::new(FileFlags::new(None))).await
}

pub async fn spawn_app_with(config: Config, flags: Arc<dyn FeatureFlagProvider>) -> TestApp {
    spawn_app_on(Arc::new(MemoryStore::new()), config, flags).await
}

async fn spawn_app_on(
    store: Arc<dyn Store>,
    config: Config,
    flags: Arc<dyn FeatureFlagProvider>,
) -> TestApp {
    let clock = Arc::new(FixedClock::new(frozen_now()));
    let state = AppState::new(store, flags, clock.clone(), config);
    let app = clinic::build_app(state.clone());

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        state,
        clock,
    }
}
