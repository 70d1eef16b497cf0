use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::identity::repository::UserRepository;
use crate::identity::service::IdentityService;
use crate::identity::token::TokenConfig;
use crate::publisher::ChangePublisher;
use crate::rooms::RoomRegistry;
use crate::store::repository::EventRepository;
use crate::store::service::AttendanceService;
use crate::ws::{BroadcastDelivery, ConnectionManager, InMemoryConnectionManager};

/// Shared application state containing all dependencies
///
/// Created once at process start and handed to every request handler
/// through axum's `State` extractor; no ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub event_repository: Arc<dyn EventRepository + Send + Sync>,
    pub user_repository: Arc<dyn UserRepository + Send + Sync>,
    pub attendance: Arc<AttendanceService>,
    pub identity: Arc<IdentityService>,
    pub rooms: Arc<RoomRegistry>,
    pub connections: Arc<dyn ConnectionManager>,
    pub publisher: ChangePublisher,
}

impl AppState {
    pub fn new(
        event_repository: Arc<dyn EventRepository + Send + Sync>,
        user_repository: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        let publisher = ChangePublisher::new(64);
        let rooms = Arc::new(RoomRegistry::new());
        let connections: Arc<dyn ConnectionManager> = Arc::new(InMemoryConnectionManager::new());
        let delivery = Arc::new(BroadcastDelivery::new(
            Arc::clone(&rooms),
            Arc::clone(&connections),
        ));
        let attendance = Arc::new(AttendanceService::new(
            Arc::clone(&event_repository),
            Arc::clone(&user_repository),
            publisher.clone(),
            delivery,
        ));
        let identity = Arc::new(IdentityService::new(
            Arc::clone(&user_repository),
            TokenConfig::new(),
        ));

        Self {
            event_repository,
            user_repository,
            attendance,
            identity,
            rooms,
            connections,
            publisher,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Jwt(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Storage error: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
