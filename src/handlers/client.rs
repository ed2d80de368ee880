//! Client handlers: list, get, create, update, delete.

use super::parse_id;
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::model::ClientPayload;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let clients = state.store.list_clients().await?;
    Ok(Json(clients))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let client = state
        .store
        .get_client(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("client {}", id)))?;
    Ok(Json(client))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ClientPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let new = payload.into_new_client()?;
    let client = state.store.create_client(new).await?;
    tracing::info!(subject = %user.subject, id = client.id, "client created");
    let location = format!("/api/Client/{}", client.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(client)))
}

/// Full overwrite. The path id selects the row; a body id is ignored.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id_str): Path<String>,
    payload: Result<Json<ClientPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(payload) = payload?;
    let fields = payload.into_fields()?;
    let affected = state.store.update_client(id, fields).await?;
    if affected != 1 {
        return Err(AppError::NotFound(format!("client {}", id)));
    }
    tracing::info!(subject = %user.subject, id, "client updated");
    Ok(StatusCode::OK)
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let affected = state.store.delete_client(id).await?;
    if affected != 1 {
        return Err(AppError::NotFound(format!("client {}", id)));
    }
    tracing::info!(subject = %user.subject, id, "client deleted");
    Ok(StatusCode::OK)
}
