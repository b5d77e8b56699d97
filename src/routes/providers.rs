use axum::extract::State;
use axum::http::StatusCode;
use uuid::Uuid;

use super::extract::{Json, Path, Query};
use super::{Created, DirectoryParams, require_contact};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Provider, ProviderInput};
use crate::state::SharedState;

pub async fn list(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Query(params): Query<DirectoryParams>,
) -> Result<Json<Vec<Provider>>, AppError> {
    let providers = state.store.list_providers(&params.into_query()).await?;
    Ok(Json(providers))
}

pub async fn get(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Provider>, AppError> {
    let provider = state
        .store
        .find_provider(id)
        .await?
        .ok_or_else(|| AppError::not_found("Doctor"))?;
    Ok(Json(provider))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ProviderInput>,
) -> Result<Created<Provider>, AppError> {
    auth.require_admin()?;
    require_contact(&req.full_name, &req.email)?;

    let provider = state.store.create_provider(&req).await?;
    Ok(Created::new(format!("/api/doctors/{}", provider.id), provider))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProviderInput>,
) -> Result<Json<Provider>, AppError> {
    auth.require_admin()?;
    require_contact(&req.full_name, &req.email)?;

    let provider = state
        .store
        .update_provider(id, &req)
        .await?
        .ok_or_else(|| AppError::not_found("Doctor"))?;
    Ok(Json(provider))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    auth.require_admin()?;

    if !state.store.delete_provider(id).await? {
        return Err(AppError::not_found("Doctor"));
    }
    Ok(StatusCode::NO_CONTENT)
}
