//! WebSocket frame DTOs

use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, EncodeError, FrameEncoder};

/// Frame sent by a client into its room
///
/// `user_id` is informational; the authenticated identity of the
/// connection always wins.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundFrame {
    #[serde(default)]
    pub user_id: Option<i64>,
    pub content: String,
}

/// Frame fanned out to every recipient in the room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub room_id: i64,
    pub user_id: i64,
    pub content: String,
}

impl InboundFrame {
    pub fn decode_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn decode_binary(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// JSON encoding of [`OutboundFrame`]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFrameEncoder;

impl FrameEncoder for JsonFrameEncoder {
    fn encode(&self, message: &ChatMessage) -> Result<String, EncodeError> {
        serde_json::to_string(&OutboundFrame::from(message)).map_err(|e| EncodeError(e.to_string()))
    }
}
