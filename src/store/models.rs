use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user. Identity is established once per login; there is no
/// password material here (mock identity provider).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserModel {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserModel {
    pub fn new(name: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A scheduled event together with its full attendee list.
///
/// This is the snapshot shape shipped over both delivery channels: the whole
/// current state, never a diff. Attendee order is insertion order so the
/// list stays stable for UI diffing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventModel {
    pub id: String,
    pub name: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub attendees: Vec<UserModel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventModel {
    pub fn new(name: String, location: String, start_time: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            location,
            start_time,
            attendees: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_attendee(&self, user_id: &str) -> bool {
        self.attendees.iter().any(|u| u.id == user_id)
    }
}
