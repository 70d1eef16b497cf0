use std::sync::Arc;
use tracing::{debug, warn};

use super::connection_manager::ConnectionManager;
use super::messages::SocketMessage;
use crate::rooms::RoomRegistry;
use crate::store::models::EventModel;

/// Pushes event snapshots to every transport session registered in the
/// event's room
///
/// This is the second delivery path next to the publisher subscriptions; a
/// client listening on both will see the same snapshot twice and is expected
/// to apply it idempotently. Failures here are logged and swallowed - they
/// must never reach the mutation that triggered the delivery.
pub struct BroadcastDelivery {
    rooms: Arc<RoomRegistry>,
    connections: Arc<dyn ConnectionManager>,
}

impl BroadcastDelivery {
    pub fn new(rooms: Arc<RoomRegistry>, connections: Arc<dyn ConnectionManager>) -> Self {
        Self { rooms, connections }
    }

    pub async fn deliver(&self, snapshot: &EventModel) {
        let sessions = self.rooms.sessions_in_room(&snapshot.id).await;
        if sessions.is_empty() {
            debug!(event_id = %snapshot.id, "No sessions in room - nothing to deliver");
            return;
        }

        let message = match SocketMessage::event_updated(snapshot)
            .and_then(|m| serde_json::to_string(&m))
        {
            Ok(message) => message,
            Err(e) => {
                warn!(event_id = %snapshot.id, error = %e, "Failed to encode snapshot");
                return;
            }
        };

        debug!(
            event_id = %snapshot.id,
            sessions = sessions.len(),
            "Broadcasting snapshot to room"
        );
        self.connections.send_to_sessions(&sessions, &message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::connection_manager::InMemoryConnectionManager;
    use crate::ws::messages::MessageType;
    use chrono::Utc;
    use tokio::sync::mpsc;

    fn snapshot(name: &str) -> EventModel {
        EventModel::new(name.to_string(), "here".to_string(), Utc::now())
    }

    #[tokio::test]
    async fn test_delivers_only_to_room_members() {
        let rooms = Arc::new(RoomRegistry::new());
        let connections = Arc::new(InMemoryConnectionManager::new());
        let delivery = BroadcastDelivery::new(rooms.clone(), connections.clone());

        let (tx_in, mut rx_in) = mpsc::unbounded_channel();
        let (tx_out, mut rx_out) = mpsc::unbounded_channel();
        connections.add_connection("member".to_string(), tx_in).await;
        connections
            .add_connection("outsider".to_string(), tx_out)
            .await;

        let event = snapshot("Tech Meetup");
        rooms.join_room("member", &event.id).await;

        delivery.deliver(&event).await;

        let raw = rx_in.recv().await.unwrap();
        let message: SocketMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(message.message_type, MessageType::EventUpdated);
        let delivered: EventModel = serde_json::from_value(message.payload).unwrap();
        assert_eq!(delivered, event);

        assert!(rx_out.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_empty_room_is_noop() {
        let rooms = Arc::new(RoomRegistry::new());
        let connections = Arc::new(InMemoryConnectionManager::new());
        let delivery = BroadcastDelivery::new(rooms, connections);

        delivery.deliver(&snapshot("nobody watching")).await;
    }

    #[tokio::test]
    async fn test_stale_session_in_room_is_skipped() {
        let rooms = Arc::new(RoomRegistry::new());
        let connections = Arc::new(InMemoryConnectionManager::new());
        let delivery = BroadcastDelivery::new(rooms.clone(), connections.clone());

        let event = snapshot("Tech Meetup");
        // Session joined a room but its connection is already gone
        rooms.join_room("stale", &event.id).await;

        delivery.deliver(&event).await;
    }
}
