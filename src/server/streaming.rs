//! HTTP byte-range file serving.
//!
//! Implements single-range `bytes=<start>-<end>` requests. Anything the
//! parser does not understand is a client error; the server never answers
//! with a silently truncated or reinterpreted range.

use std::io::SeekFrom;
use std::path::Path;

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::Response;
use tokio::io::AsyncSeekExt;
use tokio_util::io::ReaderStream;

use crate::error::{Error, Result};
use crate::paths::content_type;

/// Stream chunk size for range and whole-file responses.
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Parse a `Range` header value against a file of `file_size` bytes.
///
/// Returns the inclusive `(start, end)` byte offsets. Only the single-range
/// `bytes=` form is accepted; multiple ranges, suffix/open forms that fall
/// outside the file, and malformed input are all [`Error::InvalidRange`].
pub fn parse_range(header: &str, file_size: u64) -> Result<(u64, u64)> {
    let spec = header
        .strip_prefix("bytes=")
        .ok_or_else(|| Error::InvalidRange(format!("unsupported range unit: {header}")))?;

    if spec.contains(',') {
        return Err(Error::InvalidRange(
            "multiple ranges are not supported".into(),
        ));
    }

    let (start_raw, end_raw) = spec
        .split_once('-')
        .ok_or_else(|| Error::InvalidRange(format!("malformed range: {header}")))?;

    if start_raw.is_empty() && end_raw.is_empty() {
        return Err(Error::InvalidRange(format!("malformed range: {header}")));
    }

    let start = if start_raw.is_empty() {
        0
    } else {
        start_raw
            .parse::<u64>()
            .map_err(|_| Error::InvalidRange(format!("malformed range start: {start_raw}")))?
    };

    let end = if end_raw.is_empty() {
        file_size
            .checked_sub(1)
            .ok_or_else(|| Error::InvalidRange("range requested on empty file".into()))?
    } else {
        end_raw
            .parse::<u64>()
            .map_err(|_| Error::InvalidRange(format!("malformed range end: {end_raw}")))?
    };

    if start > end || end >= file_size {
        return Err(Error::InvalidRange(format!(
            "range {start}-{end} out of bounds for size {file_size}"
        )));
    }

    Ok((start, end))
}

/// Serve `path` as a full (200) or partial (206) response.
///
/// `HEAD` requests get the same headers with an empty body and no file
/// open. A missing file is [`Error::NotFound`].
pub async fn serve_file(
    path: &Path,
    range_header: Option<&str>,
    method: &Method,
) -> Result<Response> {
    let meta = tokio::fs::metadata(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::not_found("file", path.display())
        } else {
            Error::Io { source: e }
        }
    })?;
    let file_size = meta.len();
    let mime = content_type(path);

    let range = range_header
        .map(|h| parse_range(h, file_size))
        .transpose()?;

    let (status, start, length) = match range {
        Some((start, end)) => (StatusCode::PARTIAL_CONTENT, start, end - start + 1),
        None => (StatusCode::OK, 0, file_size),
    };

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, mime)
        .header(header::CONTENT_LENGTH, length)
        .header(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    if let Some((start, end)) = range {
        builder = builder.header(
            header::CONTENT_RANGE,
            format!("bytes {start}-{end}/{file_size}"),
        );
    }

    if method == Method::HEAD {
        return builder
            .body(Body::empty())
            .map_err(|e| Error::Internal(format!("building response: {e}")));
    }

    let mut file = tokio::fs::File::open(path).await?;
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }
    let limited = tokio::io::AsyncReadExt::take(file, length);
    let stream = ReaderStream::with_capacity(limited, STREAM_CHUNK_SIZE);

    builder
        .body(Body::from_stream(stream))
        .map_err(|e| Error::Internal(format!("building response: {e}")))
}
