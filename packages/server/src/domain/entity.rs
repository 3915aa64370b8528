//! Entities
//!
//! 永続化されるエンティティ（User, Room, StoredMessage, SystemLog）と、
//! リアルタイム配信でのみ使われる一時的な ChatMessage を定義します。

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::value_object::{Email, Role, RoomId, UserId};

/// Registered user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    /// bcrypt hash; never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User data before an id has been assigned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: Role,
}

/// Chat room
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_by: UserId,
    pub room_admins: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.room_admins.contains(&user_id)
    }
}

/// Room data before an id has been assigned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoom {
    pub name: String,
    pub description: Option<String>,
    pub created_by: UserId,
}

/// One message received over a room connection
///
/// Transient: owned by the call stack processing one inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub room_id: RoomId,
    pub sender: UserId,
    pub content: String,
    pub server_received_at: DateTime<Utc>,
}

/// Message as persisted by the store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMessage {
    pub id: i64,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Audit record for one HTTP request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemLog {
    pub id: i64,
    pub method: String,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub status_code: u16,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Audit record before an id has been assigned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewSystemLog {
    pub method: String,
    pub endpoint: String,
    pub user_id: Option<UserId>,
    pub status_code: u16,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Identity established by the auth collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub role: Role,
    pub email: String,
}

impl AuthenticatedUser {
    pub fn has_role(&self, required: Role) -> bool {
        self.role.at_least(required)
    }
}
