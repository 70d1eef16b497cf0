use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::store::models::EventModel;

/// Client-side view of event state fed by any mix of delivery channels
///
/// Apply is last-snapshot-wins: the incoming snapshot replaces the stored
/// one wholesale, never merged as a diff. Applying the same snapshot twice
/// (both channels deliver the same mutation) leaves the cache unchanged, so
/// duplicate delivery is an explicit non-event.
#[derive(Debug, Default)]
pub struct EventCache {
    events: RwLock<HashMap<String, EventModel>>,
}

impl EventCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached state for the snapshot's event unconditionally
    pub async fn apply(&self, snapshot: EventModel) {
        let mut events = self.events.write().await;
        events.insert(snapshot.id.clone(), snapshot);
    }

    pub async fn get(&self, event_id: &str) -> Option<EventModel> {
        let events = self.events.read().await;
        events.get(event_id).cloned()
    }

    /// Replaces the whole cache from a full event-list fetch
    pub async fn replace_all(&self, snapshots: Vec<EventModel>) {
        let mut events = self.events.write().await;
        events.clear();
        for snapshot in snapshots {
            events.insert(snapshot.id.clone(), snapshot);
        }
    }
}
