pub mod appointments;
pub mod auth;
pub mod extract;
pub mod flags;
pub mod patients;
pub mod providers;

use axum::Json;
use axum::Router;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::{DirectoryQuery, clamp_limit};
use crate::error::AppError;
use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/health", get(health))
        // Auth
        .route("/api/auth/token", post(auth::token))
        .route("/api/auth/register", post(auth::register))
        // Feature flags
        .route("/api/feature-flags", get(flags::snapshot))
        // Patients
        .route("/api/patients", get(patients::list).post(patients::create))
        .route(
            "/api/patients/{id}",
            get(patients::get)
                .put(patients::update)
                .delete(patients::delete),
        )
        // Doctors
        .route("/api/doctors", get(providers::list).post(providers::create))
        .route(
            "/api/doctors/{id}",
            get(providers::get)
                .put(providers::update)
                .delete(providers::delete),
        )
        // Appointments
        .route(
            "/api/appointments",
            get(appointments::list).post(appointments::create),
        )
        .route(
            "/api/appointments/{id}",
            get(appointments::get)
                .put(appointments::update)
                .delete(appointments::delete),
        )
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `201 Created` with a `Location` header pointing at the new resource.
pub struct Created<T> {
    location: String,
    body: T,
}

impl<T> Created<T> {
    pub fn new(location: String, body: T) -> Self {
        Self { location, body }
    }
}

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (
            StatusCode::CREATED,
            [(header::LOCATION, self.location)],
            Json(self.body),
        )
            .into_response()
    }
}

/// Query string shared by the patient and doctor listings.
#[derive(Debug, Default, Deserialize)]
pub struct DirectoryParams {
    #[serde(alias = "patientName", alias = "doctorName")]
    pub q: Option<String>,
    pub limit: Option<i64>,
}

impl DirectoryParams {
    pub fn into_query(self) -> DirectoryQuery {
        DirectoryQuery {
            search: self
                .q
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            limit: clamp_limit(self.limit),
        }
    }
}

pub(crate) fn require_contact(full_name: &str, email: &str) -> Result<(), AppError> {
    if full_name.trim().is_empty() || email.trim().is_empty() {
        return Err(AppError::BadRequest(
            "FullName and Email are required".to_string(),
        ));
    }
    Ok(())
}
