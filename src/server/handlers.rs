//! HTTP request handlers for file download and upload.
//!
//! # Endpoints
//!
//! - `GET /{path}?signature=..&expires=..` - Download a file, honouring `Range`
//! - `PUT /{path}?signature=..&expires=..` - Upload a file that does not exist yet
//!
//! Both handlers run behind the authorization middleware and receive the
//! validated path as an [`AuthorizedPath`] extension.

use std::io;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Extension, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::auth::AuthorizedPath;
use crate::error::StorageError;
use crate::storage::FileStore;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FileStore>,
}

impl AppState {
    pub fn new(store: FileStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert StorageError to a plain-text HTTP response.
///
/// 5xx errors are logged at ERROR, 404s at DEBUG, other client errors at WARN.
impl IntoResponse for StorageError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found\n"),
            StorageError::Conflict(_) => (StatusCode::CONFLICT, "File already exists\n"),
            StorageError::RangeNotSatisfiable { .. } => {
                (StatusCode::RANGE_NOT_SATISFIABLE, "Range Not Satisfiable\n")
            }
            StorageError::Io { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error\n")
            }
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), "Server error: {}", self);
        } else if status == StatusCode::NOT_FOUND {
            debug!(status = status.as_u16(), "Resource not found: {}", self);
        } else {
            warn!(status = status.as_u16(), "Client error: {}", self);
        }

        let mut response = (status, body).into_response();
        if let StorageError::RangeNotSatisfiable { size } = self {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", size)) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }
        response
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle file downloads.
///
/// # Request Headers
///
/// - `Range: bytes=<start>-[<end>]` (optional)
///
/// # Response
///
/// - `200 OK`: whole file, with `Content-Length`
/// - `206 Partial Content`: the requested span, with `Content-Length`,
///   `Content-Range` and `Accept-Ranges: bytes`
/// - `404 Not Found`: no file at the path
/// - `416 Range Not Satisfiable`: malformed or out-of-bounds range
/// - `500 Internal Server Error`: I/O failure before streaming started
pub async fn download_handler(
    State(state): State<AppState>,
    Extension(path): Extension<AuthorizedPath>,
    headers: HeaderMap,
) -> Result<Response, StorageError> {
    // A non-ASCII Range header can never parse; let the range parser reject it.
    let range_header = headers
        .get(header::RANGE)
        .map(|value| value.to_str().unwrap_or_default());

    let download = state.store.open(&path, range_header).await?;

    let mut builder = Response::builder()
        .header(header::CONTENT_LENGTH, download.content_length())
        .header(header::CONTENT_TYPE, "application/octet-stream");

    builder = match download.range() {
        Some(range) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_RANGE, range.content_range(download.total_size()))
            .header(header::ACCEPT_RANGES, "bytes"),
        None => builder.status(StatusCode::OK),
    };

    builder
        .body(Body::from_stream(download.into_stream()))
        .map_err(|e| StorageError::io("building response", io::Error::other(e)))
}

/// Handle file uploads.
///
/// The request body is streamed to a staging file and published atomically.
///
/// # Response
///
/// - `200 OK`: plain-text confirmation
/// - `409 Conflict`: a file already exists at the path
/// - `500 Internal Server Error`: body or filesystem failure
pub async fn upload_handler(
    State(state): State<AppState>,
    Extension(path): Extension<AuthorizedPath>,
    body: Body,
) -> Result<Response, StorageError> {
    let written = state.store.store(&path, body.into_data_stream()).await?;

    Ok((
        StatusCode::OK,
        format!("Stored {} ({} bytes)\n", path, written),
    )
        .into_response())
}

// =============================================================================
// Tests
// =============================================================================
