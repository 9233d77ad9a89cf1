//! HTTP error mapping.
//!
//! Handlers return `Result<_, AppError>`; the [`IntoResponse`] impl turns a
//! domain [`Error`] into a plain-text response with the matching status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::Error;

/// Newtype so the domain error can implement axum's [`IntoResponse`].
#[derive(Debug)]
pub struct AppError(pub Error);

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, status = %status, "request rejected");
        }

        (status, self.0.to_string()).into_response()
    }
}
