use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{corrupt_row, storage_error};
use crate::domain::{NewSystemLog, RepositoryError, SystemLog, SystemLogRepository, UserId};

#[derive(sqlx::FromRow)]
struct SystemLogRow {
    id: i64,
    method: String,
    endpoint: String,
    user_id: Option<i64>,
    status_code: i32,
    message: String,
    timestamp: DateTime<Utc>,
}

impl TryFrom<SystemLogRow> for SystemLog {
    type Error = RepositoryError;

    fn try_from(row: SystemLogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            method: row.method,
            endpoint: row.endpoint,
            user_id: row.user_id.map(UserId::new).transpose().map_err(corrupt_row)?,
            status_code: u16::try_from(row.status_code)
                .map_err(|_| RepositoryError::Storage(format!("corrupt row: status {}", row.status_code)))?,
            message: row.message,
            timestamp: row.timestamp,
        })
    }
}

pub struct PostgresSystemLogRepository {
    pool: PgPool,
}

impl PostgresSystemLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, method, endpoint, user_id, status_code, message, timestamp";

#[async_trait]
impl SystemLogRepository for PostgresSystemLogRepository {
    async fn append(&self, entry: NewSystemLog) -> Result<SystemLog, RepositoryError> {
        let sql = format!(
            "INSERT INTO system_logs (method, endpoint, user_id, status_code, message, timestamp) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SystemLogRow>(&sql)
            .bind(&entry.method)
            .bind(&entry.endpoint)
            .bind(entry.user_id.map(|id| id.value()))
            .bind(i32::from(entry.status_code))
            .bind(&entry.message)
            .bind(entry.timestamp)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?
            .try_into()
    }

    async fn list_logs(&self) -> Result<Vec<SystemLog>, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM system_logs ORDER BY timestamp DESC, id DESC");
        sqlx::query_as::<_, SystemLogRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(SystemLog::try_from)
            .collect()
    }

    async fn list_logs_by_user(&self, user_id: UserId) -> Result<Vec<SystemLog>, RepositoryError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM system_logs WHERE user_id = $1 ORDER BY timestamp DESC, id DESC"
        );
        sqlx::query_as::<_, SystemLogRow>(&sql)
            .bind(user_id.value())
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?
            .into_iter()
            .map(SystemLog::try_from)
            .collect()
    }
}
