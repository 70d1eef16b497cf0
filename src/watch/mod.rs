// Public API - what other modules can use
pub use handler::watch_handler;

// Internal modules
mod handler;
