//! Room registry trait
//!
//! 部屋 ID から「その部屋に接続中のコネクション集合」へのマップ。
//! 全ての接続処理タスクから同時にアクセスされる唯一の共有可変状態です。

use super::{
    connection::ConnectionHandle,
    value_object::{ConnectionId, RoomId},
};

/// In-memory map from room to its live connections
///
/// Every operation is short and synchronous: implementations must never hold
/// their lock across a send to a remote connection.
#[cfg_attr(test, mockall::automock)]
pub trait RoomRegistry: Send + Sync {
    /// Add `connection` under its own room. Returns `false` (and registers
    /// nothing) when the connection has already been closed.
    fn register(&self, connection: ConnectionHandle) -> bool;

    /// Remove a connection if present; a missing entry is not an error.
    fn deregister(&self, room_id: RoomId, connection_id: ConnectionId) -> Option<ConnectionHandle>;

    /// Copy of the live connections currently registered to `room_id`.
    fn snapshot(&self, room_id: RoomId) -> Vec<ConnectionHandle>;

    fn room_size(&self, room_id: RoomId) -> usize;

    fn connection_count(&self) -> usize;

    /// Rooms with at least one connection, with their sizes.
    fn active_rooms(&self) -> Vec<(RoomId, usize)>;
}
