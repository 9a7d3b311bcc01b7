//! HTTP handlers for the client directory

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::services::client::{ClientInput, ClientService, ClientView};
use crate::AppState;

/// Create a client
pub async fn create_client(
    State(state): State<AppState>,
    Json(input): Json<ClientInput>,
) -> AppResult<Json<ClientView>> {
    let service = ClientService::new(state.db);
    let client = service.create_client(input).await?;
    Ok(Json(client))
}

/// List all clients
pub async fn list_clients(State(state): State<AppState>) -> AppResult<Json<Vec<ClientView>>> {
    let service = ClientService::new(state.db);
    let clients = service.list_clients().await?;
    Ok(Json(clients))
}

/// Get one client
pub async fn get_client(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
) -> AppResult<Json<ClientView>> {
    let service = ClientService::new(state.db);
    let client = service.get_client(client_id).await?;
    Ok(Json(client))
}

/// Update a client
pub async fn update_client(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
    Json(input): Json<ClientInput>,
) -> AppResult<Json<ClientView>> {
    let service = ClientService::new(state.db);
    let client = service.update_client(client_id, input).await?;
    Ok(Json(client))
}

/// Delete a client with no stock history
pub async fn delete_client(
    State(state): State<AppState>,
    Path(client_id): Path<i64>,
) -> AppResult<Json<serde_json::Value>> {
    let service = ClientService::new(state.db);
    service.delete_client(client_id).await?;
    Ok(Json(serde_json::json!({ "deleted": client_id })))
}
