//! Room endpoints.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::{Role, Room, RoomId, UserId},
    infrastructure::dto::http::{
        AddMemberRequest, CreateRoomRequest, CreateRoomResponse, IsAdminResponse, MessageResponse,
    },
    ui::{error::ApiError, middleware::AuthUser, state::AppState},
};

/// `POST /rooms` (admin+)
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), ApiError> {
    let user = auth.require(Role::Admin)?;
    let room = state
        .create_room_usecase
        .execute(body.name, body.description, user.user_id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            message: "room created".to_string(),
            room,
        }),
    ))
}

/// `GET /rooms` (super-admin)
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<Room>>, ApiError> {
    auth.require(Role::SuperAdmin)?;
    Ok(Json(state.list_rooms_usecase.execute().await?))
}

/// `GET /rooms/{room_id}`
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, ApiError> {
    let room_id = RoomId::parse(&room_id)?;
    Ok(Json(state.get_room_usecase.execute(room_id).await?))
}

/// `DELETE /rooms/{room_id}` (admin+, and admin of that room)
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let user = auth.require(Role::Admin)?;
    let room_id = RoomId::parse(&room_id)?;
    state.delete_room_usecase.execute(room_id, &user).await?;
    Ok(Json(MessageResponse {
        message: format!("room {room_id} deleted"),
    }))
}

/// `GET /rooms/{room_id}/is-admin`
pub async fn is_room_admin(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<String>,
) -> Result<Json<IsAdminResponse>, ApiError> {
    let room_id = RoomId::parse(&room_id)?;
    let exist = state
        .check_room_admin_usecase
        .execute(room_id, user.user_id)
        .await?;
    Ok(Json(IsAdminResponse { exist }))
}

/// `POST /rooms/{room_id}/users` (room admin)
pub async fn add_room_member(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<String>,
    Json(body): Json<AddMemberRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let room_id = RoomId::parse(&room_id)?;
    let member = UserId::new(body.user_id)?;
    state
        .add_room_member_usecase
        .execute(room_id, &user, member)
        .await?;
    Ok(Json(MessageResponse {
        message: format!("user {member} added to room {room_id}"),
    }))
}
