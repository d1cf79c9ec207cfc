//! Error types and their HTTP status mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use ufs_store::StoreError;

/// Gateway error type.
///
/// Every variant maps to a bare status code: error responses carry no body.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Path does not match the gateway's pattern
    #[error("malformed request path: {0}")]
    BadPath(String),

    #[error("store not found: {0}")]
    StoreNotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Range header present but unusable
    #[error("range not satisfiable: {0}")]
    RangeNotSatisfiable(String),

    /// A store hook is registered with the wrong shape
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Writing the temp file failed
    #[error("upload write failed: {0}")]
    Write(#[source] std::io::Error),

    /// Reading the request body failed
    #[error("request body error: {0}")]
    RequestBody(String),

    /// Panic or cancellation captured by the fault boundary
    #[error("download aborted: {0}")]
    Fault(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadPath(_) => StatusCode::BAD_REQUEST,
            Self::StoreNotFound(_) | Self::FileNotFound(_) => StatusCode::NOT_FOUND,
            Self::RangeNotSatisfiable(_) => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Configuration(_)
            | Self::Write(_)
            | Self::RequestBody(_)
            | Self::Fault(_)
            | Self::Store(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.status_code().into_response()
    }
}
