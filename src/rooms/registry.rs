use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

/// Maps live transport sessions to the event rooms they are registered in
///
/// Holds identifiers only, never event data. Both directions are indexed so
/// `drop_session` can clear a session out of every room without scanning.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    inner: RwLock<Membership>,
}

#[derive(Debug, Default)]
struct Membership {
    /// event_id -> sessions registered in that room
    rooms: HashMap<String, HashSet<String>>,
    /// session_id -> rooms the session is registered in
    sessions: HashMap<String, HashSet<String>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session in an event room; redundant calls are no-ops
    pub async fn join_room(&self, session_id: &str, event_id: &str) {
        let mut inner = self.inner.write().await;
        inner
            .rooms
            .entry(event_id.to_string())
            .or_default()
            .insert(session_id.to_string());
        inner
            .sessions
            .entry(session_id.to_string())
            .or_default()
            .insert(event_id.to_string());

        debug!(session_id = %session_id, event_id = %event_id, "Session joined room");
    }

    /// Removes a session from one room; redundant calls are no-ops
    pub async fn leave_room(&self, session_id: &str, event_id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(sessions) = inner.rooms.get_mut(event_id) {
            sessions.remove(session_id);
            if sessions.is_empty() {
                inner.rooms.remove(event_id);
            }
        }
        if let Some(rooms) = inner.sessions.get_mut(session_id) {
            rooms.remove(event_id);
            if rooms.is_empty() {
                inner.sessions.remove(session_id);
            }
        }

        debug!(session_id = %session_id, event_id = %event_id, "Session left room");
    }

    /// Sessions currently registered in an event's room
    pub async fn sessions_in_room(&self, event_id: &str) -> Vec<String> {
        let inner = self.inner.read().await;
        inner
            .rooms
            .get(event_id)
            .map(|sessions| sessions.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes a session from every room it is registered in
    ///
    /// Invoked on every disconnect, graceful or abrupt. Unknown sessions are
    /// a no-op so a disconnect racing a never-joined session cannot fail.
    pub async fn drop_session(&self, session_id: &str) {
        let mut inner = self.inner.write().await;
        let Some(rooms) = inner.sessions.remove(session_id) else {
            return;
        };

        for event_id in &rooms {
            if let Some(sessions) = inner.rooms.get_mut(event_id) {
                sessions.remove(session_id);
                if sessions.is_empty() {
                    inner.rooms.remove(event_id);
                }
            }
        }

        debug!(
            session_id = %session_id,
            room_count = rooms.len(),
            "Session dropped from all rooms"
        );
    }

    /// Rooms a session is currently registered in
    pub async fn rooms_for_session(&self, session_id: &str) -> Vec<String> {
        let inner = self.inner.read().await;
        inner
            .sessions
            .get(session_id)
            .map(|rooms| rooms.iter().cloned().collect())
            .unwrap_or_default()
    }
}
