// Public API - what other modules can use
pub use handlers::{get_event, join_event, leave_event, list_events};
pub use seed::seed_demo_data;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod seed;
pub mod service;
