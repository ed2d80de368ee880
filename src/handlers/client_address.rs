//! Client address handlers: the client set plus lookup by owning client.

use super::parse_id;
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::model::ClientAddressPayload;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let addresses = state.store.list_addresses().await?;
    Ok(Json(addresses))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let address = state
        .store
        .get_address(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("client address {}", id)))?;
    Ok(Json(address))
}

pub async fn read_by_client(
    State(state): State<AppState>,
    Path(client_id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let client_id = parse_id(&client_id_str)?;
    let address = state
        .store
        .get_address_by_client(client_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("address for client {}", client_id)))?;
    Ok(Json(address))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ClientAddressPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    let new = payload.into_new_address()?;
    let address = state.store.create_address(new).await?;
    tracing::info!(
        subject = %user.subject,
        id = address.id,
        client_id = address.client_id,
        "client address created"
    );
    let location = format!("/api/ClientAddress/{}", address.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(address)))
}

/// Overwrites the address columns. The owning client is fixed at creation.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id_str): Path<String>,
    payload: Result<Json<ClientAddressPayload>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let Json(payload) = payload?;
    let fields = payload.into_fields()?;
    let affected = state.store.update_address(id, fields).await?;
    if affected != 1 {
        return Err(AppError::NotFound(format!("client address {}", id)));
    }
    tracing::info!(subject = %user.subject, id, "client address updated");
    Ok(StatusCode::OK)
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let affected = state.store.delete_address(id).await?;
    if affected != 1 {
        return Err(AppError::NotFound(format!("client address {}", id)));
    }
    tracing::info!(subject = %user.subject, id, "client address deleted");
    Ok(StatusCode::OK)
}
