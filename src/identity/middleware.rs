use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::instrument;

use crate::shared::AppState;

/// Identity resolution middleware - reads the Authorization Bearer header
/// and attaches an `Identity` to the request.
///
/// Never rejects: a missing or invalid credential resolves to
/// `Identity::Anonymous` and the protected handlers enforce authentication
/// themselves. That keeps public queries and protected mutations on the
/// same router.
/// Usage: .layer(middleware::from_fn_with_state(app_state.clone(), identity::resolve_identity))
#[instrument(skip(state, req, next))]
pub async fn resolve_identity(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    let identity = state.identity.resolve(token).await;
    req.extensions_mut().insert(identity);

    next.run(req).await
}
