use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};

use super::models::EventModel;
use super::repository::{AttendanceChange, EventRepository};
use crate::identity::repository::UserRepository;
use crate::identity::Identity;
use crate::publisher::ChangePublisher;
use crate::shared::AppError;
use crate::ws::BroadcastDelivery;

/// Owns the join/leave contract over the event/attendee relation
///
/// Every successful mutation hands the resulting snapshot to both delivery
/// paths: the publisher topics (subscription channel) and the room broadcast
/// (session transport). Delivery is decoupled from the mutation's own
/// success; a failed or dropped delivery never rolls anything back.
///
/// Each event's mutate-then-deliver sequence runs under a per-event lock.
/// The repository applies the mutation atomically on its own, but without
/// the lock two concurrent mutations could deliver in the opposite order
/// from the one the store applied them in, and listeners would see an older
/// attendee set after a newer one.
pub struct AttendanceService {
    events: Arc<dyn EventRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
    publisher: ChangePublisher,
    delivery: Arc<BroadcastDelivery>,
    /// event_id -> lock spanning mutation and delivery
    mutation_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl AttendanceService {
    pub fn new(
        events: Arc<dyn EventRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
        publisher: ChangePublisher,
        delivery: Arc<BroadcastDelivery>,
    ) -> Self {
        Self {
            events,
            users,
            publisher,
            delivery,
            mutation_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Adds the authenticated caller to an event's attendee set
    ///
    /// Idempotent: joining an event the user already attends returns the
    /// current snapshot unchanged. The snapshot is republished either way;
    /// clients apply snapshots idempotently so the duplicate is harmless.
    #[instrument(skip(self, identity))]
    pub async fn join(&self, identity: &Identity, event_id: &str) -> Result<EventModel, AppError> {
        let user_id = identity.require()?;
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let lock = self.mutation_lock(event_id);
        let ordering = lock.lock().await;

        let change = self.events.add_attendee(event_id, &user).await?;
        let snapshot = match change {
            AttendanceChange::Applied(snapshot) => {
                info!(
                    event_id = %event_id,
                    user_id = %user.id,
                    attendee_count = snapshot.attendees.len(),
                    "User joined event"
                );
                snapshot
            }
            AttendanceChange::Unchanged(snapshot) => snapshot,
            AttendanceChange::EventNotFound => {
                drop(ordering);
                drop(lock);
                self.discard_unused_lock(event_id);
                return Err(AppError::NotFound("Event not found".to_string()));
            }
        };

        self.deliver(&snapshot).await;
        drop(ordering);
        Ok(snapshot)
    }

    /// Removes the authenticated caller from an event's attendee set
    ///
    /// Idempotent: leaving an event the user does not attend is a no-op.
    #[instrument(skip(self, identity))]
    pub async fn leave(&self, identity: &Identity, event_id: &str) -> Result<EventModel, AppError> {
        let user_id = identity.require()?;

        let lock = self.mutation_lock(event_id);
        let ordering = lock.lock().await;

        let change = self.events.remove_attendee(event_id, user_id).await?;
        let snapshot = match change {
            AttendanceChange::Applied(snapshot) => {
                info!(
                    event_id = %event_id,
                    user_id = %user_id,
                    attendee_count = snapshot.attendees.len(),
                    "User left event"
                );
                snapshot
            }
            AttendanceChange::Unchanged(snapshot) => snapshot,
            AttendanceChange::EventNotFound => {
                drop(ordering);
                drop(lock);
                self.discard_unused_lock(event_id);
                return Err(AppError::NotFound("Event not found".to_string()));
            }
        };

        self.deliver(&snapshot).await;
        drop(ordering);
        Ok(snapshot)
    }

    #[instrument(skip(self))]
    pub async fn get_event(&self, event_id: &str) -> Result<EventModel, AppError> {
        self.events
            .get_event(event_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list_events(&self) -> Result<Vec<EventModel>, AppError> {
        self.events.list_events().await
    }

    /// Fans the snapshot out on both channels; best-effort on each
    ///
    /// Callers hold the event's mutation lock, so snapshots go out in the
    /// order the store applied them.
    async fn deliver(&self, snapshot: &EventModel) {
        self.publisher.publish(&snapshot.id, snapshot.clone()).await;
        self.delivery.deliver(snapshot).await;
    }

    fn mutation_lock(&self, event_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.mutation_locks.lock().unwrap();
        locks.entry(event_id.to_string()).or_default().clone()
    }

    /// Drops the lock entry for an unknown event id nobody else is mutating,
    /// so repeated mutations of garbage ids cannot grow the map
    fn discard_unused_lock(&self, event_id: &str) {
        let mut locks = self.mutation_locks.lock().unwrap();
        if let Some(lock) = locks.get(event_id) {
            if Arc::strong_count(lock) == 1 {
                locks.remove(event_id);
            }
        }
    }
}
