// Public API - what other modules can use
pub use connection_manager::{ConnectionManager, InMemoryConnectionManager};
pub use fanout::BroadcastDelivery;
pub use handler::{websocket_handler, RoomMessageHandler};
pub use messages::{MessageType, RoomPayload, SocketMessage};
pub use socket::{Connection, MessageHandler, SocketError, SocketWrapper};

// Internal modules
mod connection_manager;
mod fanout;
mod handler;
mod messages;
mod socket;
