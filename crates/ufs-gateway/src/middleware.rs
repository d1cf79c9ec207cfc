//! HTTP middleware: the gateway router, request ids and request logging

use crate::handlers;
use crate::path::{parse_download_path, strip_gateway_prefix};
use crate::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Header carrying the request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Dispatch requests inside the gateway namespace; pass everything else on
pub async fn gateway_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let Some(rest) = strip_gateway_prefix(&path, &state.prefix) else {
        return next.run(request).await;
    };

    let method = request.method().clone();
    if method == Method::OPTIONS {
        handlers::preflight(state, rest, request, next).await
    } else if method == Method::POST {
        handlers::post_file(state, rest, request).await
    } else if method == Method::GET {
        match parse_download_path(rest) {
            Some(target) => handlers::get_file(state, target, request).await,
            None => next.run(request).await,
        }
    } else {
        next.run(request).await
    }
}

/// Request ID middleware - reuses an incoming `x-request-id` or mints one
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Request ID extension
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request.extensions().get::<RequestId>().cloned();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = request_id.as_ref().map(|id| id.0.as_str()).unwrap_or("-"),
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}
