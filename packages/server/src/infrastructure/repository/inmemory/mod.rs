//! InMemory Repository 実装
//!
//! `tokio::sync::Mutex` で保護した HashMap / Vec をストレージとして使用します。
//! プロセス終了とともにデータは失われます。

mod room;
mod system_log;
mod user;

pub use room::InMemoryRoomRepository;
pub use system_log::InMemorySystemLogRepository;
pub use user::InMemoryUserRepository;
