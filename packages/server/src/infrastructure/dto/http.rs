//! HTTP API DTOs

use serde::{Deserialize, Serialize};

use crate::domain::{Role, Room};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub message: String,
    pub room: Room,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IsAdminResponse {
    pub exist: bool,
}

/// Live connection count of one room
#[derive(Debug, Serialize, Deserialize)]
pub struct RoomConnections {
    pub room_id: i64,
    pub connections: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistryResponse {
    pub connections: usize,
    pub rooms: Vec<RoomConnections>,
}
