//! Handlers of the bundled application behind the gateway

use axum::{
    http::{Method, StatusCode},
    response::IntoResponse,
};

/// GET /health - Health check
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Everything the gateway passes through and no route claims.
///
/// Preflights are acknowledged so the gateway's CORS headers reach the client.
pub async fn fallback(method: Method) -> StatusCode {
    if method == Method::OPTIONS {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}
