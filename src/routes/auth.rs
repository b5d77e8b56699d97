use axum::extract::State;
use serde::Deserialize;

use super::extract::Json;
use crate::auth::{AuthResponse, Registration};
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

pub async fn token(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if let Err(retry_after) = state.login_limiter.check(&req.username) {
        tracing::warn!("Login throttled for username: {}", req.username);
        return Err(AppError::RateLimited { retry_after });
    }

    match state.auth.authenticate(&req.username, &req.password).await? {
        Some(resp) => {
            tracing::info!("Successful login for username: {}", resp.username);
            Ok(Json(resp))
        }
        None => {
            state.login_limiter.record_failure(&req.username);
            tracing::warn!("Failed login attempt for username: {}", req.username);
            Err(AppError::Unauthorized(
                "Invalid username or password".to_string(),
            ))
        }
    }
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let resp = state
        .auth
        .register(Registration {
            username: &req.username,
            email: &req.email,
            password: &req.password,
            role: req.role.as_deref(),
        })
        .await
        .inspect_err(|e| {
            if let AppError::Conflict(msg) = e {
                tracing::info!("Registration rejected for username {}: {msg}", req.username);
            }
        })?;

    Ok(Json(resp))
}
