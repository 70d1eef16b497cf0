use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tracing::info;

use super::models::{EventModel, UserModel};
use super::repository::EventRepository;
use crate::identity::repository::UserRepository;
use crate::shared::AppError;

/// Seeds the store with demo events and users for development
pub async fn seed_demo_data(
    events: &Arc<dyn EventRepository + Send + Sync>,
    users: &Arc<dyn UserRepository + Send + Sync>,
) -> Result<(), AppError> {
    let demo_events = [
        (
            "Tech Meetup 2025",
            "Silicon Valley Conference Center",
            Utc.with_ymd_and_hms(2025, 6, 25, 18, 0, 0).unwrap(),
        ),
        (
            "College Fest - Spring Edition",
            "University Campus",
            Utc.with_ymd_and_hms(2025, 6, 30, 10, 0, 0).unwrap(),
        ),
        (
            "Open Mic Night",
            "Downtown Coffee House",
            Utc.with_ymd_and_hms(2025, 7, 5, 19, 0, 0).unwrap(),
        ),
        (
            "Startup Pitch Competition",
            "Innovation Hub",
            Utc.with_ymd_and_hms(2025, 7, 10, 14, 0, 0).unwrap(),
        ),
    ];

    for (name, location, start_time) in demo_events {
        let event = EventModel::new(name.to_string(), location.to_string(), start_time);
        events.insert_event(&event).await?;
    }

    let demo_users = [
        ("John Doe", "john@example.com"),
        ("Jane Smith", "jane@example.com"),
        ("Bob Johnson", "bob@example.com"),
    ];

    for (name, email) in demo_users {
        let user = UserModel::new(name.to_string(), email.to_string());
        users.create_user(&user).await?;
    }

    info!(
        events = demo_events.len(),
        users = demo_users.len(),
        "Demo data seeded"
    );
    Ok(())
}
