//! MessagePusher trait 定義
//!
//! 部屋単位のファンアウト（ブロードキャスト）のインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    entity::ChatMessage,
    error::EncodeError,
    value_object::{ConnectionId, RoomId},
};

/// Outcome of one broadcast
///
/// A broadcast never fails as a whole: recipients that could not be reached
/// are listed in `failed` and have already been removed from the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the frame was attempted on
    pub recipients: usize,
    /// Connections the frame was enqueued on
    pub delivered: usize,
    /// Connections dropped because delivery failed
    pub failed: Vec<ConnectionId>,
}

/// Renders a chat message into the frame every recipient receives
#[cfg_attr(test, mockall::automock)]
pub trait FrameEncoder: Send + Sync {
    fn encode(&self, message: &ChatMessage) -> Result<String, EncodeError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Deliver `frame` to every live connection registered to `room_id`,
    /// except `exclude` when given.
    async fn broadcast(
        &self,
        room_id: RoomId,
        frame: String,
        exclude: Option<ConnectionId>,
    ) -> BroadcastReport;
}
