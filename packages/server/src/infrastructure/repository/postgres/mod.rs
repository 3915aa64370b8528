//! PostgreSQL Repository 実装
//!
//! sqlx の実行時クエリ（`query_as` + `FromRow`）を使用します。
//! スキーマは `packages/server/migrations/` にあり、起動時に `connect` が適用します。

mod room;
mod system_log;
mod user;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::domain::{RepositoryError, ValueObjectError};

pub use room::PostgresRoomRepository;
pub use system_log::PostgresSystemLogRepository;
pub use user::PostgresUserRepository;

/// Open a connection pool and apply pending migrations.
pub async fn connect(database_url: &str) -> Result<PgPool, RepositoryError> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(storage_error)?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| RepositoryError::Storage(format!("migration failed: {e}")))?;
    tracing::info!("Database ready");

    Ok(pool)
}

fn storage_error(e: sqlx::Error) -> RepositoryError {
    if let Some(db_error) = e.as_database_error() {
        if db_error.is_unique_violation() {
            return RepositoryError::Conflict(db_error.message().to_string());
        }
        if db_error.is_foreign_key_violation() {
            return RepositoryError::NotFound(db_error.message().to_string());
        }
    }
    tracing::error!("Database error: {:?}", e);
    RepositoryError::Storage(e.to_string())
}

fn corrupt_row(e: ValueObjectError) -> RepositoryError {
    RepositoryError::Storage(format!("corrupt row: {e}"))
}
