//! UseCase: 部屋の作成・取得・一覧・削除・管理者確認・メンバー追加
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - 部屋操作の各ユースケース
//!
//! ### なぜこのテストが必要か
//! - 部屋の管理者だけが削除・メンバー追加できることを保証
//! - 削除された部屋のライブ接続が閉じられることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：作成者が管理者になる、管理者によるメンバー追加
//! - 異常系：存在しない部屋、管理者でないユーザーによる削除

use std::sync::Arc;

use crate::domain::{
    AuthenticatedUser, NewRoom, Room, RoomId, RoomRegistry, RoomRepository, UserId,
};

use super::error::RoomError;

async fn require_room(
    rooms: &Arc<dyn RoomRepository>,
    room_id: RoomId,
) -> Result<Room, RoomError> {
    rooms
        .load_room(room_id)
        .await?
        .ok_or(RoomError::RoomNotFound(room_id))
}

pub struct CreateRoomUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl CreateRoomUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    /// The creator becomes the room's first admin and member.
    pub async fn execute(
        &self,
        name: String,
        description: Option<String>,
        created_by: UserId,
    ) -> Result<Room, RoomError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(RoomError::InvalidInput("room name must not be empty".to_string()));
        }
        let room = self
            .rooms
            .create_room(NewRoom {
                name,
                description: description.filter(|d| !d.trim().is_empty()),
                created_by,
            })
            .await?;
        tracing::info!("Room {} created by user {}", room.id, created_by);
        Ok(room)
    }
}

pub struct GetRoomUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl GetRoomUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    pub async fn execute(&self, room_id: RoomId) -> Result<Room, RoomError> {
        require_room(&self.rooms, room_id).await
    }
}

pub struct ListRoomsUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl ListRoomsUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    pub async fn execute(&self) -> Result<Vec<Room>, RoomError> {
        Ok(self.rooms.list_rooms().await?)
    }
}

pub struct DeleteRoomUseCase {
    rooms: Arc<dyn RoomRepository>,
    registry: Arc<dyn RoomRegistry>,
}

impl DeleteRoomUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>, registry: Arc<dyn RoomRegistry>) -> Self {
        Self { rooms, registry }
    }

    /// Delete a room administered by `requester`.
    ///
    /// Live connections to the room are closed; their controllers finish
    /// the teardown.
    pub async fn execute(
        &self,
        room_id: RoomId,
        requester: &AuthenticatedUser,
    ) -> Result<(), RoomError> {
        let room = require_room(&self.rooms, room_id).await?;
        if !room.is_admin(requester.user_id) {
            return Err(RoomError::NotRoomAdmin(room_id));
        }
        self.rooms.delete_room(room_id).await?;

        let live = self.registry.snapshot(room_id);
        for connection in &live {
            connection.close();
        }
        tracing::info!(
            "Room {} deleted by user {} ({} live connections closed)",
            room_id,
            requester.user_id,
            live.len()
        );
        Ok(())
    }
}

pub struct CheckRoomAdminUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl CheckRoomAdminUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    pub async fn execute(&self, room_id: RoomId, user_id: UserId) -> Result<bool, RoomError> {
        Ok(self.rooms.is_admin(room_id, user_id).await?)
    }
}

pub struct AddRoomMemberUseCase {
    rooms: Arc<dyn RoomRepository>,
}

impl AddRoomMemberUseCase {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    /// Adding an existing member is a no-op.
    pub async fn execute(
        &self,
        room_id: RoomId,
        requester: &AuthenticatedUser,
        user_id: UserId,
    ) -> Result<(), RoomError> {
        let room = require_room(&self.rooms, room_id).await?;
        if !room.is_admin(requester.user_id) {
            return Err(RoomError::NotRoomAdmin(room_id));
        }
        self.rooms.add_member(room_id, user_id).await?;
        tracing::info!("User {} added to room {}", user_id, room_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionHandle, Role},
        infrastructure::{registry::InMemoryRoomRegistry, repository::InMemoryRoomRepository},
    };

    fn user(id: i64) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: UserId::new(id).unwrap(),
            role: Role::Admin,
            email: format!("user{id}@example.com"),
        }
    }

    async fn setup() -> (Arc<dyn RoomRepository>, Room) {
        let rooms: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new());
        let room = CreateRoomUseCase::new(rooms.clone())
            .execute("general".to_string(), None, UserId::new(1).unwrap())
            .await
            .unwrap();
        (rooms, room)
    }

    #[tokio::test]
    async fn test_create_room_makes_creator_admin() {
        // テスト項目: 作成者が部屋の管理者になる
        // given (前提条件):
        let (rooms, room) = setup().await;

        // when (操作):
        let is_admin = CheckRoomAdminUseCase::new(rooms)
            .execute(room.id, UserId::new(1).unwrap())
            .await
            .unwrap();

        // then (期待する結果):
        assert!(is_admin);
        assert_eq!(room.name, "general");
    }

    #[tokio::test]
    async fn test_create_room_rejects_blank_name() {
        // テスト項目: 空の部屋名は InvalidInput
        let rooms: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new());
        let result = CreateRoomUseCase::new(rooms)
            .execute("   ".to_string(), None, UserId::new(1).unwrap())
            .await;
        assert!(matches!(result, Err(RoomError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_get_missing_room() {
        // テスト項目: 存在しない部屋の取得は RoomNotFound
        let rooms: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new());
        let room_id = RoomId::new(9).unwrap();
        let result = GetRoomUseCase::new(rooms).execute(room_id).await;
        assert_eq!(result, Err(RoomError::RoomNotFound(room_id)));
    }

    #[tokio::test]
    async fn test_delete_room_requires_room_admin() {
        // テスト項目: 部屋の管理者でないユーザーは削除できない
        // given (前提条件):
        let (rooms, room) = setup().await;
        let usecase =
            DeleteRoomUseCase::new(rooms.clone(), Arc::new(InMemoryRoomRegistry::new()));

        // when (操作):
        let result = usecase.execute(room.id, &user(2)).await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::NotRoomAdmin(room.id)));
        assert!(rooms.load_room(room.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_room_closes_live_connections() {
        // テスト項目: 部屋を削除するとライブ接続が閉じられる
        // given (前提条件):
        let (rooms, room) = setup().await;
        let registry = Arc::new(InMemoryRoomRegistry::new());
        let (connection, _rx) = ConnectionHandle::open(room.id, UserId::new(2).unwrap(), 4);
        registry.register(connection.clone());
        let usecase = DeleteRoomUseCase::new(rooms.clone(), registry.clone());

        // when (操作):
        usecase.execute(room.id, &user(1)).await.unwrap();

        // then (期待する結果):
        assert!(rooms.load_room(room.id).await.unwrap().is_none());
        assert!(!connection.is_alive());
        assert!(registry.snapshot(room.id).is_empty());
    }

    #[tokio::test]
    async fn test_add_member_by_room_admin() {
        // テスト項目: 部屋の管理者はメンバーを追加でき、非管理者は追加できない
        // given (前提条件):
        let (rooms, room) = setup().await;
        let usecase = AddRoomMemberUseCase::new(rooms.clone());
        let member = UserId::new(2).unwrap();

        // when (操作):
        let by_admin = usecase.execute(room.id, &user(1), member).await;
        let by_other = usecase
            .execute(room.id, &user(2), UserId::new(3).unwrap())
            .await;

        // then (期待する結果):
        assert_eq!(by_admin, Ok(()));
        assert_eq!(by_other, Err(RoomError::NotRoomAdmin(room.id)));
        assert!(rooms.is_member(room.id, member).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_rooms() {
        // テスト項目: 作成した部屋が一覧に含まれる
        let (rooms, room) = setup().await;
        let listed = ListRoomsUseCase::new(rooms).execute().await.unwrap();
        assert_eq!(listed, vec![room]);
    }
}
