use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument};

use super::models::{EventModel, UserModel};
use crate::shared::AppError;

/// Result of an attendee mutation against the store
#[derive(Debug, Clone)]
pub enum AttendanceChange {
    /// The attendee set changed; returns the resulting snapshot
    Applied(EventModel),
    /// The mutation was a no-op (already attending / not attending);
    /// returns the current snapshot unchanged
    Unchanged(EventModel),
    /// Event does not exist
    EventNotFound,
}

/// Trait for the authoritative event/attendee relation
///
/// All attendee writes go through `add_attendee`/`remove_attendee`; there is
/// no other mutation path to the attendee set.
#[async_trait]
pub trait EventRepository {
    async fn insert_event(&self, event: &EventModel) -> Result<(), AppError>;
    async fn get_event(&self, event_id: &str) -> Result<Option<EventModel>, AppError>;

    /// Lists all events ordered by start time ascending
    async fn list_events(&self) -> Result<Vec<EventModel>, AppError>;

    /// Atomically adds a user to an event's attendee set
    ///
    /// Check-and-update runs under a single critical section so concurrent
    /// join/join or join/leave races on the same event cannot lose updates.
    async fn add_attendee(
        &self,
        event_id: &str,
        user: &UserModel,
    ) -> Result<AttendanceChange, AppError>;

    /// Atomically removes a user from an event's attendee set
    async fn remove_attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<AttendanceChange, AppError>;
}

/// In-memory implementation of EventRepository for development and testing
pub struct InMemoryEventRepository {
    events: Mutex<HashMap<String, EventModel>>,
}

impl Default for InMemoryEventRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    #[instrument(skip(self, event))]
    async fn insert_event(&self, event: &EventModel) -> Result<(), AppError> {
        let mut events = self.events.lock().unwrap();
        if events.contains_key(&event.id) {
            return Err(AppError::Storage("Event already exists".to_string()));
        }
        events.insert(event.id.clone(), event.clone());

        debug!(event_id = %event.id, name = %event.name, "Event inserted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_event(&self, event_id: &str) -> Result<Option<EventModel>, AppError> {
        let events = self.events.lock().unwrap();
        Ok(events.get(event_id).cloned())
    }

    #[instrument(skip(self))]
    async fn list_events(&self) -> Result<Vec<EventModel>, AppError> {
        let events = self.events.lock().unwrap();
        let mut list: Vec<EventModel> = events.values().cloned().collect();
        list.sort_by(|a, b| a.start_time.cmp(&b.start_time));
        Ok(list)
    }

    #[instrument(skip(self, user))]
    async fn add_attendee(
        &self,
        event_id: &str,
        user: &UserModel,
    ) -> Result<AttendanceChange, AppError> {
        let mut events = self.events.lock().unwrap();

        let event = match events.get_mut(event_id) {
            Some(event) => event,
            None => {
                debug!(event_id = %event_id, "Event not found");
                return Ok(AttendanceChange::EventNotFound);
            }
        };

        if event.has_attendee(&user.id) {
            debug!(event_id = %event_id, user_id = %user.id, "User already attending");
            return Ok(AttendanceChange::Unchanged(event.clone()));
        }

        event.attendees.push(user.clone());
        event.updated_at = Utc::now();

        debug!(
            event_id = %event_id,
            user_id = %user.id,
            attendee_count = event.attendees.len(),
            "Attendee added"
        );
        Ok(AttendanceChange::Applied(event.clone()))
    }

    #[instrument(skip(self))]
    async fn remove_attendee(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<AttendanceChange, AppError> {
        let mut events = self.events.lock().unwrap();

        let event = match events.get_mut(event_id) {
            Some(event) => event,
            None => {
                debug!(event_id = %event_id, "Event not found");
                return Ok(AttendanceChange::EventNotFound);
            }
        };

        if !event.has_attendee(user_id) {
            debug!(event_id = %event_id, user_id = %user_id, "User not attending");
            return Ok(AttendanceChange::Unchanged(event.clone()));
        }

        event.attendees.retain(|u| u.id != user_id);
        event.updated_at = Utc::now();

        debug!(
            event_id = %event_id,
            user_id = %user_id,
            attendee_count = event.attendees.len(),
            "Attendee removed"
        );
        Ok(AttendanceChange::Applied(event.clone()))
    }
}
