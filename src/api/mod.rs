//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use routes::{create_router, AppState};

/// Build the application router
///
/// Layers run outside-in: logging, then auth, then the route handler.
/// `/health` sits outside both.
pub fn build_router(state: AppState) -> Router {
    let protected_routes = create_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::logging_middleware));

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api/v1", protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
