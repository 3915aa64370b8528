//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装（InMemory / PostgreSQL）は Infrastructure 層が提供します。

use async_trait::async_trait;

use super::{
    entity::{NewRoom, NewSystemLog, NewUser, Room, StoredMessage, SystemLog, User},
    error::RepositoryError,
    value_object::{RoomId, UserId},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Fails with `Conflict` when the e-mail is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;
}

/// Room store, membership predicates and message persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Insert a room; its creator becomes its first admin.
    async fn create_room(&self, room: NewRoom) -> Result<Room, RepositoryError>;

    async fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, RepositoryError>;

    async fn list_rooms(&self) -> Result<Vec<Room>, RepositoryError>;

    /// Delete a room together with its memberships and messages.
    async fn delete_room(&self, room_id: RoomId) -> Result<(), RepositoryError>;

    async fn is_member(&self, room_id: RoomId, user_id: UserId) -> Result<bool, RepositoryError>;

    async fn is_admin(&self, room_id: RoomId, user_id: UserId) -> Result<bool, RepositoryError>;

    /// Add a member; adding an existing member is a no-op.
    async fn add_member(&self, room_id: RoomId, user_id: UserId) -> Result<(), RepositoryError>;

    async fn room_admins(&self, room_id: RoomId) -> Result<Vec<UserId>, RepositoryError>;

    async fn save_message(
        &self,
        room_id: RoomId,
        user_id: UserId,
        content: &str,
    ) -> Result<StoredMessage, RepositoryError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SystemLogRepository: Send + Sync {
    async fn append(&self, entry: NewSystemLog) -> Result<SystemLog, RepositoryError>;

    async fn list_logs(&self) -> Result<Vec<SystemLog>, RepositoryError>;

    async fn list_logs_by_user(&self, user_id: UserId) -> Result<Vec<SystemLog>, RepositoryError>;
}
