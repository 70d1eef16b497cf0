// Library crate for the event attendance server
// This file exposes the public API for integration tests

pub mod identity;
pub mod publisher;
pub mod rooms;
pub mod shared;
pub mod store;
pub mod sync;
pub mod watch;
pub mod ws;

// Re-export commonly used types for easier access in tests
pub use identity::{Identity, LoginRequest, LoginResponse};
pub use publisher::{ChangePublisher, Subscription};
pub use rooms::RoomRegistry;
pub use shared::{AppError, AppState};
pub use store::models::{EventModel, UserModel};
pub use store::service::AttendanceService;
pub use sync::{EventCache, PollFallback};
pub use ws::{
    BroadcastDelivery, ConnectionManager, InMemoryConnectionManager, MessageType, SocketMessage,
};
