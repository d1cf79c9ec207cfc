//! OPTIONS /{store}/{fileId} - CORS preflight for uploads

use super::allow_cors;
use crate::path::parse_upload_path;
use crate::{AppState, GatewayError};
use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Validate the target, then decorate whatever the inner application answers
pub async fn preflight(
    state: Arc<AppState>,
    rest: &str,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(target) = parse_upload_path(rest) else {
        return GatewayError::BadPath(rest.to_string()).into_response();
    };
    if let Err(e) = state.store(&target.store) {
        return e.into_response();
    }

    let mut response = next.run(request).await;
    allow_cors(response.headers_mut());
    response
}
