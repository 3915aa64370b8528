//! User endpoints.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    domain::{Role, User},
    infrastructure::dto::http::{LoginRequest, MessageResponse, RegisterUserRequest, TokenResponse},
    ui::{
        error::ApiError,
        middleware::{AuthUser, MaybeAuthUser},
        state::AppState,
    },
    usecase::RegisterUser,
};

/// `POST /users/add`
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    MaybeAuthUser(requester): MaybeAuthUser,
    Json(body): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let request = RegisterUser {
        name: body.name,
        email: body.email,
        password: body.password,
        role: body.role.unwrap_or(Role::User),
    };
    let user = state
        .register_user_usecase
        .execute(request, requester.as_ref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("user {} created", user.id),
        }),
    ))
}

/// `POST /users/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = state
        .login_usecase
        .execute(&body.email, body.password)
        .await?;
    Ok(Json(TokenResponse { token }))
}

/// `GET /users` (admin+)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<User>>, ApiError> {
    auth.require(Role::Admin)?;
    Ok(Json(state.list_users_usecase.execute().await?))
}
