use serde::{Deserialize, Serialize};

use crate::store::models::EventModel;

/// Message types for the session transport
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum MessageType {
    // Client -> Server
    JoinRoom,
    LeaveRoom,

    // Server -> Client
    EventUpdated,
    Error,
}

/// Base structure for transport messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
}

/// Payload for join-room / leave-room requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub event_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl SocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
        }
    }

    /// Create an EVENT-UPDATED message carrying a full event snapshot
    pub fn event_updated(snapshot: &EventModel) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            MessageType::EventUpdated,
            serde_json::to_value(snapshot)?,
        ))
    }

    /// Create an ERROR message
    pub fn error(message: String) -> Self {
        let payload = ErrorPayload { message };
        Self::new(
            MessageType::Error,
            serde_json::to_value(payload).unwrap_or_default(),
        )
    }

    /// Extract the event id from a join-room / leave-room payload
    pub fn room_payload(&self) -> Option<RoomPayload> {
        serde_json::from_value(self.payload.clone()).ok()
    }
}
