//! Conversion logic between DTOs and domain entities.

use crate::domain::{ChatMessage, RoomId};
use crate::infrastructure::dto::{http, websocket};

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&ChatMessage> for websocket::OutboundFrame {
    fn from(message: &ChatMessage) -> Self {
        Self {
            room_id: message.room_id.value(),
            user_id: message.sender.value(),
            content: message.content.clone(),
        }
    }
}

impl From<(RoomId, usize)> for http::RoomConnections {
    fn from((room_id, connections): (RoomId, usize)) -> Self {
        Self {
            room_id: room_id.value(),
            connections,
        }
    }
}
