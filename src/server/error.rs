//! HTTP error responses.

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::github::error::{ErrorKind, GitOpsError};

const RETRY_AFTER_SECONDS: &str = "5";

/// Failure answered by a route handler.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or wrong bearer key.
    Unauthorized,
    /// Any failure from validation, the queue, or the hosting API.
    Operation(GitOpsError),
}

impl From<GitOpsError> for ApiError {
    fn from(error: GitOpsError) -> Self {
        Self::Operation(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "missing or invalid API key", "kind": "unauthorized"})),
            )
                .into_response(),
            Self::Operation(error) => {
                let status = StatusCode::from_u16(error.http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                if status.is_server_error() {
                    tracing::warn!(error = %error, status = status.as_u16(), "request failed");
                }
                let kind = error.kind();
                let mut response = (
                    status,
                    Json(json!({"error": error.to_string(), "kind": kind})),
                )
                    .into_response();
                if kind == ErrorKind::Backpressure {
                    response.headers_mut().insert(
                        header::RETRY_AFTER,
                        HeaderValue::from_static(RETRY_AFTER_SECONDS),
                    );
                }
                response
            }
        }
    }
}
