use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{Json, Path, Query};
use super::Created;
use crate::auth::AuthUser;
use crate::db::{AppointmentQuery, clamp_limit};
use crate::error::AppError;
use crate::flags::REMINDERS_ENABLED;
use crate::models::{Appointment, AppointmentInput};
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search_text: Option<String>,
    pub from_utc: Option<DateTime<Utc>>,
    pub to_utc: Option<DateTime<Utc>>,
    pub provider_id: Option<Uuid>,
    pub limit: Option<i64>,
}

impl ListParams {
    fn into_query(self) -> AppointmentQuery {
        AppointmentQuery {
            search_text: self
                .search_text
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            from_utc: self.from_utc,
            to_utc: self.to_utc,
            provider_id: self.provider_id,
            limit: clamp_limit(self.limit),
        }
    }
}

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let appointments = state.store.list_appointments(&params.into_query()).await?;
    Ok(Json(appointments))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state
        .store
        .find_appointment(id)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment"))?;
    Ok(Json(appointment))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<AppointmentInput>,
) -> Result<Created<Appointment>, AppError> {
    auth.require_admin()?;

    let appointment = state.scheduler.schedule(&req).await?;

    if state.flags.check(REMINDERS_ENABLED).await {
        dispatch_reminder(&appointment);
    }

    Ok(Created::new(
        format!("/api/appointments/{}", appointment.id),
        appointment,
    ))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AppointmentInput>,
) -> Result<Json<Appointment>, AppError> {
    auth.require_admin()?;

    let appointment = state.scheduler.reschedule(id, &req).await?;
    Ok(Json(appointment))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_admin()?;

    if !state.store.delete_appointment(id).await? {
        return Err(AppError::not_found("Appointment"));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Reminder delivery is not wired to any channel yet; the booking is only logged.
fn dispatch_reminder(appointment: &Appointment) {
    tracing::info!(
        appointment_id = %appointment.id,
        starts_at = %appointment.starts_at_utc,
        "Would enqueue reminder for appointment"
    );
}
