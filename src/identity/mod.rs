// Public API - what other modules can use
pub use handlers::{login, me};
pub use middleware::resolve_identity;
pub use types::{AuthClaims, Identity, LoginRequest, LoginResponse};

// Internal modules
mod handlers;
mod middleware;
pub mod repository;
pub mod service;
pub mod token;
mod types;
