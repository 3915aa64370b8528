//! Repository 実装
//!
//! - `inmemory`: HashMap をストレージとして使う実装（デフォルト・テスト用）
//! - `postgres`: sqlx を使った PostgreSQL 実装（`DATABASE_URL` 指定時）

pub mod inmemory;
pub mod postgres;

pub use inmemory::{InMemoryRoomRepository, InMemorySystemLogRepository, InMemoryUserRepository};
pub use postgres::{PostgresRoomRepository, PostgresSystemLogRepository, PostgresUserRepository};
