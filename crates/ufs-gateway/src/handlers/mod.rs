//! Gateway request handlers

pub mod download;
pub mod preflight;
pub mod service;
pub mod upload;

pub use download::get_file;
pub use preflight::preflight;
pub use service::{fallback, health_check};
pub use upload::post_file;

use axum::http::{header, HeaderMap, HeaderValue};

/// Attach the upload CORS headers
pub fn allow_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}
