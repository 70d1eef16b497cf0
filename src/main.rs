use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use rollcall::identity::{self, repository::InMemoryUserRepository};
use rollcall::shared::AppState;
use rollcall::store::{self, repository::InMemoryEventRepository};
use rollcall::{watch, ws};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting attendance server");

    // Create shared application state with dependency injection
    let event_repository = Arc::new(InMemoryEventRepository::new());
    let user_repository = Arc::new(InMemoryUserRepository::new());
    let app_state = AppState::new(event_repository, user_repository);

    if let Err(e) =
        store::seed_demo_data(&app_state.event_repository, &app_state.user_repository).await
    {
        tracing::warn!(error = %e, "Seeding demo data failed");
    }

    // Query/mutation surface, the two push channels, and identity
    let app = Router::new()
        .route("/login", post(identity::login))
        .route("/me", get(identity::me))
        .route("/events", get(store::list_events))
        .route("/events/:id", get(store::get_event))
        .route("/events/:id/join", post(store::join_event))
        .route("/events/:id/leave", post(store::leave_event))
        .route("/events/:id/watch", get(watch::watch_handler))
        .route("/ws", get(ws::websocket_handler))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            identity::resolve_identity,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind server address");
    info!("Server running on http://{}", bind_addr);
    axum::serve(listener, app).await.expect("Server error");
}
