use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use super::cache::EventCache;
use crate::store::service::AttendanceService;

/// Fallback reconciliation timer for one watched event
///
/// Every tick re-fetches the full event through the store query surface and
/// replaces the cached state, bounding staleness by the poll period even if
/// both push channels drop every message. A failed tick is skipped; the next
/// one retries.
pub struct PollFallback {
    handle: JoinHandle<()>,
}

impl PollFallback {
    pub fn spawn(
        attendance: Arc<AttendanceService>,
        cache: Arc<EventCache>,
        event_id: String,
        period: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match attendance.get_event(&event_id).await {
                    Ok(snapshot) => cache.apply(snapshot).await,
                    Err(e) => {
                        debug!(event_id = %event_id, error = %e, "Poll failed - retrying next tick");
                    }
                }
            }
        });

        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for PollFallback {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::repository::{InMemoryUserRepository, UserRepository};
    use crate::identity::Identity;
    use crate::publisher::ChangePublisher;
    use crate::rooms::RoomRegistry;
    use crate::store::models::{EventModel, UserModel};
    use crate::store::repository::{EventRepository, InMemoryEventRepository};
    use crate::ws::{BroadcastDelivery, InMemoryConnectionManager};
    use chrono::Utc;

    async fn attendance_with_event() -> (Arc<AttendanceService>, EventModel, Identity) {
        let events = Arc::new(InMemoryEventRepository::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let rooms = Arc::new(RoomRegistry::new());
        let connections = Arc::new(InMemoryConnectionManager::new());
        let delivery = Arc::new(BroadcastDelivery::new(rooms, connections));

        let event = EventModel::new("Tech Meetup".to_string(), "Hub".to_string(), Utc::now());
        events.insert_event(&event).await.unwrap();
        let user = UserModel::new("john".to_string(), "john@example.com".to_string());
        users.create_user(&user).await.unwrap();

        let service = Arc::new(AttendanceService::new(
            events,
            users,
            ChangePublisher::new(8),
            delivery,
        ));
        (service, event, Identity::Authenticated { user_id: user.id })
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_reconciles_missed_delivery() {
        let (attendance, event, identity) = attendance_with_event().await;
        let cache = Arc::new(EventCache::new());

        // Mutation happens while the cache heard nothing from either channel
        attendance.join(&identity, &event.id).await.unwrap();

        let poller = PollFallback::spawn(
            Arc::clone(&attendance),
            Arc::clone(&cache),
            event.id.clone(),
            Duration::from_secs(5),
        );

        // Advance past a poll tick; the cache converges to store state
        tokio::time::sleep(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;

        let cached = cache.get(&event.id).await.unwrap();
        assert_eq!(cached.attendees.len(), 1);

        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_of_unknown_event_retries_without_caching() {
        let (attendance, _event, _identity) = attendance_with_event().await;
        let cache = Arc::new(EventCache::new());

        let _poller = PollFallback::spawn(
            attendance,
            Arc::clone(&cache),
            "missing".to_string(),
            Duration::from_secs(5),
        );

        tokio::time::sleep(Duration::from_secs(11)).await;
        tokio::task::yield_now().await;

        assert!(cache.get("missing").await.is_none());
    }
}
