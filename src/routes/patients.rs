use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use super::extract::{Json, Path, Query};
use super::{Created, DirectoryParams, require_contact};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Patient, PatientInput};
use crate::state::SharedState;

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<DirectoryParams>,
) -> Result<Json<Vec<Patient>>, AppError> {
    let patients = state.store.list_patients(&params.into_query()).await?;
    Ok(Json(patients))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Patient>, AppError> {
    let patient = state
        .store
        .find_patient(id)
        .await?
        .ok_or_else(|| AppError::not_found("Patient"))?;
    Ok(Json(patient))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<PatientInput>,
) -> Result<Created<Patient>, AppError> {
    auth.require_admin()?;
    require_contact(&req.full_name, &req.email)?;

    let patient = state.store.create_patient(&req).await?;
    Ok(Created::new(format!("/api/patients/{}", patient.id), patient))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<PatientInput>,
) -> Result<Json<Patient>, AppError> {
    auth.require_admin()?;
    require_contact(&req.full_name, &req.email)?;

    let patient = state
        .store
        .update_patient(id, &req)
        .await?
        .ok_or_else(|| AppError::not_found("Patient"))?;
    Ok(Json(patient))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_admin()?;

    if !state.store.delete_patient(id).await? {
        return Err(AppError::not_found("Patient"));
    }
    Ok(StatusCode::NO_CONTENT)
}
