//! GET /{store}/{fileId}[.ext][/name] - stream a file
//!
//! Pipeline, in order: read authorization hook, range resolution, backend
//! stream, transform hook, optional compression, response. Everything after
//! the record lookup runs inside a per-request [`FaultBoundary`].

use crate::encoding::{compress, negotiate};
use crate::fault::FaultBoundary;
use crate::middleware::RequestId;
use crate::path::FilePath;
use crate::range::resolve_range;
use crate::stream::{ReadErrorReporter, ReadGuard};
use crate::{AppState, GatewayError};
use axum::{
    body::Body,
    http::{header, request, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error};
use ufs_store::{ByteStream, FileRecord, ReadAccess, ResponseHead, Store};

/// Entry point for GET requests whose path matched the download pattern
pub async fn get_file(state: Arc<AppState>, target: FilePath, request: Request<Body>) -> Response {
    serve_file(state, target, request)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

async fn serve_file(
    state: Arc<AppState>,
    target: FilePath,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    let store = state.store(&target.store)?;

    if let Err(e) = store.check_hooks() {
        error!(store = %store.name(), error = %e, "Store read hooks are misconfigured");
        return Err(GatewayError::Configuration(e.to_string()));
    }

    let record = store
        .catalog()
        .find_by_id(&target.file_id)
        .await?
        .ok_or_else(|| GatewayError::FileNotFound(target.file_id.clone()))?;
    debug!(
        store = %store.name(),
        file_id = %target.file_id,
        extension = ?target.extension,
        file_name = ?target.file_name,
        "Download requested"
    );

    if let Some(delay) = state.config.read_delay() {
        tokio::time::sleep(delay).await;
    }

    let (parts, _body) = request.into_parts();
    let scope = match parts.extensions.get::<RequestId>() {
        Some(RequestId(id)) => format!("{}/{} ({})", store.name(), target.file_id, id),
        None => format!("{}/{}", store.name(), target.file_id),
    };
    let boundary = FaultBoundary::new(scope);

    boundary
        .run(stream_file(
            boundary.clone(),
            store,
            target.file_id,
            record,
            parts,
        ))
        .await
}

fn response_with(status: StatusCode, headers: axum::http::HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

async fn stream_file(
    boundary: FaultBoundary,
    store: Arc<dyn Store>,
    file_id: String,
    record: FileRecord,
    request: request::Parts,
) -> Result<Response, GatewayError> {
    // Access check
    let mut head = ResponseHead::default();
    if store.on_read(&file_id, &record, &request, &mut head).await == ReadAccess::Deny {
        debug!(store = %store.name(), file_id = %file_id, status = %head.status, "Read denied");
        return Ok(response_with(head.status, head.headers, Body::empty()));
    }

    let mut headers = head.headers;
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&record.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    let range = resolve_range(request.headers.get(header::RANGE), record.size)?;
    let status = match range {
        Some(range) => {
            let content_range = HeaderValue::from_str(&range.content_range())
                .map_err(|e| GatewayError::Internal(e.to_string()))?;
            headers.insert(header::CONTENT_RANGE, content_range);
            headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(range.len()));
            StatusCode::PARTIAL_CONTENT
        }
        None => {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(record.size));
            StatusCode::OK
        }
    };

    let reporter = ReadErrorReporter::new(Arc::clone(&store), file_id.clone(), record.clone());
    let source = match store.open_read_stream(&file_id, &record, range).await {
        Ok(source) => source,
        Err(e) => {
            reporter.report(&std::io::Error::other(e.to_string()));
            return Err(e.into());
        }
    };
    let source: ByteStream = Box::pin(ReadGuard::source(source, Arc::clone(&reporter)));

    // The hook sees the headers before they are sent
    let transformed = store.transform_read(source, &file_id, &record, &request, &mut headers);
    let declared_len = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let mut body: ByteStream = Box::pin(
        ReadGuard::passthrough(transformed, reporter).with_expected_len(declared_len),
    );

    if let Some(encoding) = negotiate(request.headers.get(header::ACCEPT_ENCODING), &record.content_type) {
        headers.remove(header::CONTENT_LENGTH);
        headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static(encoding.as_str()));
        body = compress(body, encoding);
    }

    debug!(
        store = %store.name(),
        file_id = %file_id,
        scope = %boundary.scope(),
        status = %status,
        range = ?range,
        encoding = ?headers.get(header::CONTENT_ENCODING),
        "Streaming file"
    );

    Ok(response_with(
        status,
        headers,
        Body::from_stream(boundary.guard_stream(body)),
    ))
}
