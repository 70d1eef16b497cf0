use std::sync::Arc;
use tokio::sync::mpsc;

use rollcall::identity::repository::InMemoryUserRepository;
use rollcall::store::repository::{EventRepository, InMemoryEventRepository};
use rollcall::{AppState, ConnectionManager, EventModel, Identity, MessageType, SocketMessage};

/// In-process wiring of the whole sync subsystem plus one seeded event and
/// two logged-in users
pub struct TestSetup {
    pub state: AppState,
    pub event: EventModel,
    pub alice: Identity,
    pub bob: Identity,
}

pub async fn setup() -> TestSetup {
    let state = AppState::new(
        Arc::new(InMemoryEventRepository::new()),
        Arc::new(InMemoryUserRepository::new()),
    );

    let event = EventModel::new(
        "Tech Meetup 2025".to_string(),
        "Innovation Hub".to_string(),
        chrono::Utc::now(),
    );
    state.event_repository.insert_event(&event).await.unwrap();

    let alice = login(&state, "alice@example.com").await;
    let bob = login(&state, "bob@example.com").await;

    TestSetup {
        state,
        event,
        alice,
        bob,
    }
}

pub async fn login(state: &AppState, email: &str) -> Identity {
    let response = state.identity.login(email, "password").await.unwrap();
    Identity::Authenticated {
        user_id: response.user.id,
    }
}

/// Registers a fake transport session and returns its outbound frame queue
pub async fn connect_session(state: &AppState, session_id: &str) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    state.connections.add_connection(session_id.to_string(), tx).await;
    rx
}

/// Decodes an outbound frame and asserts it is an event-updated snapshot
pub fn decode_snapshot(raw: &str) -> EventModel {
    let message: SocketMessage = serde_json::from_str(raw).expect("frame should be valid JSON");
    assert_eq!(message.message_type, MessageType::EventUpdated);
    serde_json::from_value(message.payload).expect("payload should be an event snapshot")
}
