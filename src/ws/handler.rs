use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::rooms::RoomRegistry;
use crate::shared::AppState;

use super::messages::{MessageType, SocketMessage};
use super::socket::{Connection, MessageHandler};

/// Routes join-room / leave-room frames from one session to the registry
pub struct RoomMessageHandler {
    rooms: Arc<RoomRegistry>,
}

impl RoomMessageHandler {
    pub fn new(rooms: Arc<RoomRegistry>) -> Self {
        Self { rooms }
    }
}

#[async_trait]
impl MessageHandler for RoomMessageHandler {
    async fn handle_message(&self, session_id: &str, message: String) {
        let parsed = match serde_json::from_str::<SocketMessage>(&message) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to parse transport message"
                );
                return;
            }
        };

        match parsed.message_type {
            MessageType::JoinRoom => match parsed.room_payload() {
                Some(payload) => {
                    info!(
                        session_id = %session_id,
                        event_id = %payload.event_id,
                        "Session joining room"
                    );
                    self.rooms.join_room(session_id, &payload.event_id).await;
                }
                None => warn!(session_id = %session_id, "join-room without event id"),
            },
            MessageType::LeaveRoom => match parsed.room_payload() {
                Some(payload) => {
                    info!(
                        session_id = %session_id,
                        event_id = %payload.event_id,
                        "Session leaving room"
                    );
                    self.rooms.leave_room(session_id, &payload.event_id).await;
                }
                None => warn!(session_id = %session_id, "leave-room without event id"),
            },
            other => {
                debug!(
                    session_id = %session_id,
                    message_type = ?other,
                    "Unhandled message type"
                );
            }
        }
    }
}

/// Broadcast-transport endpoint
///
/// GET /ws - no credential required; a session is a connection identity,
/// distinct from the authenticated user identity used on mutations.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_session(socket, state))
}

async fn handle_session(socket: axum::extract::ws::WebSocket, state: AppState) {
    let session_id = Uuid::new_v4().to_string();
    info!(session_id = %session_id, "Session connected");

    let (sender, receiver) = mpsc::unbounded_channel();
    state
        .connections
        .add_connection(session_id.clone(), sender)
        .await;

    let handler = Arc::new(RoomMessageHandler::new(Arc::clone(&state.rooms)));
    let connection = Connection::new(session_id.clone(), Box::new(socket), receiver, handler);

    if let Err(e) = connection.run().await {
        debug!(session_id = %session_id, error = ?e, "Session ended with transport error");
    }

    // Runs on every disconnect path, abrupt drops included
    state.connections.remove_connection(&session_id).await;
    state.rooms.drop_session(&session_id).await;
    info!(session_id = %session_id, "Session disconnected");
}
