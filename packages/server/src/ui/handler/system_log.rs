//! Audit log endpoints (admin+).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    domain::{Role, SystemLog, UserId},
    ui::{error::ApiError, middleware::AuthUser, state::AppState},
};

/// `GET /logs`
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<SystemLog>>, ApiError> {
    auth.require(Role::Admin)?;
    Ok(Json(state.list_system_logs_usecase.execute(None).await?))
}

/// `GET /logs/user/{user_id}`
pub async fn list_logs_by_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<SystemLog>>, ApiError> {
    auth.require(Role::Admin)?;
    let user_id = UserId::new(user_id)?;
    Ok(Json(
        state.list_system_logs_usecase.execute(Some(user_id)).await?,
    ))
}
