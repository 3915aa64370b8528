//! InMemory Room Repository 実装
//!
//! 部屋・メンバーシップ・メッセージを 1 つの Mutex で保護して保持します。
//! 部屋の削除はメンバーシップとメッセージも合わせて削除します。

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use roomcast_shared::time::{Clock, SystemClock};
use tokio::sync::Mutex;

use crate::domain::{
    NewRoom, RepositoryError, Room, RoomId, RoomRepository, StoredMessage, UserId,
};

#[derive(Default)]
struct Store {
    next_room_id: i64,
    next_message_id: i64,
    rooms: HashMap<RoomId, Room>,
    members: HashMap<RoomId, HashSet<UserId>>,
    messages: Vec<StoredMessage>,
}

impl Store {
    fn room(&self, room_id: RoomId) -> Result<&Room, RepositoryError> {
        self.rooms
            .get(&room_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("room {room_id}")))
    }
}

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    store: Mutex<Store>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            clock,
        }
    }
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_room(&self, room: NewRoom) -> Result<Room, RepositoryError> {
        let mut store = self.store.lock().await;
        store.next_room_id += 1;
        let id = RoomId::new(store.next_room_id)
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        let now = self.clock.now();
        let created = Room {
            id,
            name: room.name,
            description: room.description,
            created_by: room.created_by,
            room_admins: vec![room.created_by],
            created_at: now,
            updated_at: now,
        };
        store.rooms.insert(id, created.clone());
        store.members.insert(id, HashSet::from([room.created_by]));
        Ok(created)
    }

    async fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store.rooms.get(&room_id).cloned())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        let store = self.store.lock().await;
        let mut rooms: Vec<Room> = store.rooms.values().cloned().collect();
        rooms.sort_by_key(|room| room.id);
        Ok(rooms)
    }

    async fn delete_room(&self, room_id: RoomId) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        if store.rooms.remove(&room_id).is_none() {
            return Err(RepositoryError::NotFound(format!("room {room_id}")));
        }
        store.members.remove(&room_id);
        store.messages.retain(|m| m.room_id != room_id);
        Ok(())
    }

    async fn is_member(&self, room_id: RoomId, user_id: UserId) -> Result<bool, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .members
            .get(&room_id)
            .is_some_and(|members| members.contains(&user_id)))
    }

    async fn is_admin(&self, room_id: RoomId, user_id: UserId) -> Result<bool, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store
            .rooms
            .get(&room_id)
            .is_some_and(|room| room.is_admin(user_id)))
    }

    async fn add_member(&self, room_id: RoomId, user_id: UserId) -> Result<(), RepositoryError> {
        let mut store = self.store.lock().await;
        store.room(room_id)?;
        store.members.entry(room_id).or_default().insert(user_id);
        Ok(())
    }

    async fn room_admins(&self, room_id: RoomId) -> Result<Vec<UserId>, RepositoryError> {
        let store = self.store.lock().await;
        Ok(store.room(room_id)?.room_admins.clone())
    }

    async fn save_message(
        &self,
        room_id: RoomId,
        user_id: UserId,
        content: &str,
    ) -> Result<StoredMessage, RepositoryError> {
        let mut store = self.store.lock().await;
        store.room(room_id)?;
        store.next_message_id += 1;
        let message = StoredMessage {
            id: store.next_message_id,
            room_id,
            user_id,
            content: content.to_string(),
            created_at: self.clock.now(),
        };
        store.messages.push(message.clone());
        Ok(message)
    }
}
