use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{corrupt_row, storage_error};
use crate::domain::{
    NewRoom, RepositoryError, Room, RoomId, RoomRepository, StoredMessage, UserId,
};

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: i64,
    name: String,
    description: Option<String>,
    created_by: i64,
    room_admins: Vec<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoomRow> for Room {
    type Error = RepositoryError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RoomId::new(row.id).map_err(corrupt_row)?,
            name: row.name,
            description: row.description,
            created_by: UserId::new(row.created_by).map_err(corrupt_row)?,
            room_admins: row
                .room_admins
                .into_iter()
                .map(UserId::new)
                .collect::<Result<_, _>>()
                .map_err(corrupt_row)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: i64,
    room_id: i64,
    user_id: i64,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for StoredMessage {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            room_id: RoomId::new(row.room_id).map_err(corrupt_row)?,
            user_id: UserId::new(row.user_id).map_err(corrupt_row)?,
            content: row.content,
            created_at: row.created_at,
        })
    }
}

pub struct PostgresRoomRepository {
    pool: PgPool,
}

impl PostgresRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PostgresRoomRepository {
    async fn create_room(&self, room: NewRoom) -> Result<Room, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            INSERT INTO rooms (name, description, created_by, room_admins)
            VALUES ($1, $2, $3, ARRAY[$3]::BIGINT[])
            RETURNING id, name, description, created_by, room_admins, created_at, updated_at
            "#,
        )
        .bind(&room.name)
        .bind(&room.description)
        .bind(room.created_by.value())
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        sqlx::query("INSERT INTO room_users (room_id, user_id) VALUES ($1, $2)")
            .bind(row.id)
            .bind(room.created_by.value())
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)?;
        row.try_into()
    }

    async fn load_room(&self, room_id: RoomId) -> Result<Option<Room>, RepositoryError> {
        sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT id, name, description, created_by, room_admins, created_at, updated_at
            FROM rooms
            WHERE id = $1
            "#,
        )
        .bind(room_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?
        .map(Room::try_from)
        .transpose()
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, RepositoryError> {
        sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT id, name, description, created_by, room_admins, created_at, updated_at
            FROM rooms
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?
        .into_iter()
        .map(Room::try_from)
        .collect()
    }

    async fn delete_room(&self, room_id: RoomId) -> Result<(), RepositoryError> {
        // room_users and messages go with the room (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(room_id.value())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("room {room_id}")));
        }
        Ok(())
    }

    async fn is_member(&self, room_id: RoomId, user_id: UserId) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM room_users WHERE room_id = $1 AND user_id = $2)",
        )
        .bind(room_id.value())
        .bind(user_id.value())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)
    }

    async fn is_admin(&self, room_id: RoomId, user_id: UserId) -> Result<bool, RepositoryError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM rooms WHERE id = $1 AND $2 = ANY(room_admins))",
        )
        .bind(room_id.value())
        .bind(user_id.value())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)
    }

    async fn add_member(&self, room_id: RoomId, user_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO room_users (room_id, user_id)
            SELECT id, $2 FROM rooms WHERE id = $1
            ON CONFLICT (room_id, user_id) DO NOTHING
            "#,
        )
        .bind(room_id.value())
        .bind(user_id.value())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        if result.rows_affected() == 0 && self.load_room(room_id).await?.is_none() {
            return Err(RepositoryError::NotFound(format!("room {room_id}")));
        }
        Ok(())
    }

    async fn room_admins(&self, room_id: RoomId) -> Result<Vec<UserId>, RepositoryError> {
        self.load_room(room_id)
            .await?
            .map(|room| room.room_admins)
            .ok_or_else(|| RepositoryError::NotFound(format!("room {room_id}")))
    }

    async fn save_message(
        &self,
        room_id: RoomId,
        user_id: UserId,
        content: &str,
    ) -> Result<StoredMessage, RepositoryError> {
        sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (room_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, room_id, user_id, content, created_at
            "#,
        )
        .bind(room_id.value())
        .bind(user_id.value())
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?
        .try_into()
    }
}
