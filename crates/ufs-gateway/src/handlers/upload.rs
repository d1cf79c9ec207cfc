//! POST /{store}/{fileId} - append a chunk to an upload

use super::allow_cors;
use crate::path::parse_upload_path;
use crate::{AppState, GatewayError};
use axum::{
    body::Body,
    extract::Query,
    http::{header, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};
use ufs_store::{FileUpdate, Store};

/// Upload query parameters
#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    /// Client-reported progress fraction
    pub progress: Option<String>,
}

/// Client-reported progress: finite and positive values only, at most 1
pub fn parse_progress(uri: &Uri) -> Option<f64> {
    let Query(params) = Query::<UploadParams>::try_from_uri(uri).ok()?;
    params
        .progress?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
        .map(|p| p.min(1.0))
}

/// Entry point for POST requests inside the gateway namespace
pub async fn post_file(state: Arc<AppState>, rest: &str, request: Request<Body>) -> Response {
    let Some(target) = parse_upload_path(rest) else {
        return GatewayError::BadPath(rest.to_string()).into_response();
    };
    let store = match state.store(&target.store) {
        Ok(store) => store,
        Err(e) => return e.into_response(),
    };

    let mut response = receive_upload(&state, store, &target.file_id, request)
        .await
        .unwrap_or_else(IntoResponse::into_response);
    allow_cors(response.headers_mut());
    response
}

async fn receive_upload(
    state: &AppState,
    store: Arc<dyn Store>,
    file_id: &str,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    if store.catalog().find_by_id(file_id).await?.is_none() {
        return Err(GatewayError::FileNotFound(file_id.to_string()));
    }

    let progress = parse_progress(request.uri());
    let temp_path = state.temp.path_for(file_id)?;
    let _permit = state.uploads.acquire(file_id).await;

    let mut file: Option<File> = None;
    let mut received: u64 = 0;
    let mut body = request.into_body().into_data_stream();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| {
            warn!(file_id = %file_id, error = %e, "Upload request stream failed");
            GatewayError::RequestBody(e.to_string())
        })?;

        // Created on the first chunk
        if file.is_none() {
            match state.temp.open_append(&temp_path).await {
                Ok(opened) => file = Some(opened),
                Err(e) => return Err(write_failed(state, file_id, &temp_path, e).await),
            }
        }
        if let Some(target) = file.as_mut() {
            if let Err(e) = target.write_all(&chunk).await {
                return Err(write_failed(state, file_id, &temp_path, e).await);
            }
        }
        received += chunk.len() as u64;
    }

    store
        .catalog()
        .update(file_id, FileUpdate::upload_received(progress))
        .await
        .map_err(|e| {
            error!(store = %store.name(), file_id = %file_id, error = %e, "Cannot update upload state");
            GatewayError::from(e)
        })?;

    if let Some(mut file) = file {
        let closed = async {
            file.flush().await?;
            file.sync_all().await
        };
        if let Err(e) = closed.await {
            return Err(write_failed(state, file_id, &temp_path, e).await);
        }
    }

    debug!(
        store = %store.name(),
        file_id = %file_id,
        bytes = received,
        progress = ?progress,
        active_uploads = state.uploads.active_count(),
        "Upload chunk stored"
    );

    Ok((StatusCode::NO_CONTENT, [(header::CONTENT_TYPE, "text/plain")]).into_response())
}

async fn write_failed(
    state: &AppState,
    file_id: &str,
    temp_path: &Path,
    e: std::io::Error,
) -> GatewayError {
    error!(file_id = %file_id, error = %e, "Cannot write chunk of file");
    state.temp.discard(temp_path).await;
    GatewayError::Write(e)
}
