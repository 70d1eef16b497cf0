use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::instrument;

use super::models::EventModel;
use crate::identity::Identity;
use crate::shared::{AppError, AppState};

/// HTTP handler for listing all events
///
/// GET /events
/// Returns events sorted by start time ascending.
#[instrument(name = "list_events", skip(state))]
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventModel>>, AppError> {
    let events = state.attendance.list_events().await?;
    Ok(Json(events))
}

/// HTTP handler for fetching a single event
///
/// GET /events/:id
/// Also serves as the poll-fallback query: clients re-fetch this on a timer
/// and replace their local snapshot wholesale.
#[instrument(name = "get_event", skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<EventModel>, AppError> {
    let event = state.attendance.get_event(&event_id).await?;
    Ok(Json(event))
}

/// HTTP handler for joining an event
///
/// POST /events/:id/join
/// Requires an authenticated identity; idempotent.
#[instrument(name = "join_event", skip(state, identity))]
pub async fn join_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<String>,
) -> Result<Json<EventModel>, AppError> {
    let snapshot = state.attendance.join(&identity, &event_id).await?;
    Ok(Json(snapshot))
}

/// HTTP handler for leaving an event
///
/// POST /events/:id/leave
/// Requires an authenticated identity; idempotent.
#[instrument(name = "leave_event", skip(state, identity))]
pub async fn leave_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(event_id): Path<String>,
) -> Result<Json<EventModel>, AppError> {
    let snapshot = state.attendance.leave(&identity, &event_id).await?;
    Ok(Json(snapshot))
}
