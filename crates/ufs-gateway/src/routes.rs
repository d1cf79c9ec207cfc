//! HTTP route definitions

use crate::{handlers, middleware, AppState};
use axum::{middleware as axum_middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Create the main router.
///
/// The gateway sits in front of a minimal application (`/health` and a
/// fallback) and only hands it requests outside its namespace.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .fallback(handlers::fallback)
        // Apply middleware
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::gateway_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
}
