use axum::{extract::State, Extension, Json};
use tracing::{info, instrument};

use super::types::{Identity, LoginRequest, LoginResponse};
use crate::shared::{AppError, AppState};
use crate::store::models::UserModel;

/// HTTP handler for logging in
///
/// POST /login
/// Mock authentication: finds or creates the user by email and returns a
/// bearer token with the user profile.
#[instrument(name = "login", skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = state.identity.login(&request.email, &request.password).await?;

    info!(user_id = %response.user.id, "Login successful");
    Ok(Json(response))
}

/// HTTP handler for the authenticated caller's profile
///
/// GET /me
/// Requires a resolved identity; anonymous callers get 401.
#[instrument(name = "me", skip(state))]
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserModel>, AppError> {
    let user = state.identity.me(&identity).await?;
    Ok(Json(user))
}
