// Public API - what other modules can use
pub use change_publisher::{ChangePublisher, Subscription};

// Internal modules
mod change_publisher;
