//! Health and diagnostics endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    domain::Role,
    infrastructure::dto::http::{HealthResponse, RegistryResponse, RoomConnections},
    ui::{error::ApiError, middleware::AuthUser, state::AppState},
};

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Live connection counts per room (admin+)
pub async fn debug_registry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<RegistryResponse>, ApiError> {
    auth.require(Role::Admin)?;
    let rooms: Vec<RoomConnections> = state
        .registry
        .active_rooms()
        .into_iter()
        .map(RoomConnections::from)
        .collect();
    Ok(Json(RegistryResponse {
        connections: state.registry.connection_count(),
        rooms,
    }))
}
