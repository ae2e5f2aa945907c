//! Error types for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Authentication failed.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks ownership or group membership.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Project, instance or task absent (or ambiguous).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (missing launch fields and the like).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Requested path resolves outside the task's secondary directory.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A collaborating service failed or was unreachable.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Secondary storage I/O error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<warehouse_client::Error> for ServerError {
    fn from(e: warehouse_client::Error) -> Self {
        match e {
            warehouse_client::Error::NotFound(msg) => ServerError::NotFound(msg),
            warehouse_client::Error::Auth(msg) | warehouse_client::Error::Forbidden(msg) => {
                ServerError::Forbidden(msg)
            }
            warehouse_client::Error::Config(msg) => ServerError::Config(msg),
            other => ServerError::Upstream(other.to_string()),
        }
    }
}

impl From<warehouse_store::StoreError> for ServerError {
    fn from(e: warehouse_store::StoreError) -> Self {
        ServerError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::NotFound => ServerError::NotFound(e.to_string()),
            _ => ServerError::Storage(e.to_string()),
        }
    }
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ServerError {
    /// HTTP status and machine-readable code.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ServerError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::InvalidPath(_) => (StatusCode::BAD_REQUEST, "invalid_path"),
            ServerError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            ServerError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ServerError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error")
            }
            ServerError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, code, error = %message, "Server error");
        } else {
            tracing::warn!(status = %status, code, error = %message, "Client error");
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_mapping() {
        let not_found: ServerError = warehouse_client::Error::NotFound("x".to_string()).into();
        assert!(matches!(not_found, ServerError::NotFound(_)));

        let denied: ServerError = warehouse_client::Error::Auth("expired".to_string()).into();
        assert!(matches!(denied, ServerError::Forbidden(_)));

        let upstream: ServerError = warehouse_client::Error::Api {
            status: 500,
            message: "boom".to_string(),
        }
        .into();
        assert_eq!(upstream.status_and_code().0, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_io_not_found_maps_to_404() {
        let err: ServerError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert_eq!(err.status_and_code(), (StatusCode::NOT_FOUND, "not_found"));

        let err: ServerError = std::io::Error::from(std::io::ErrorKind::PermissionDenied).into();
        assert_eq!(err.status_and_code().1, "storage_error");
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ServerError::InvalidPath("../etc".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "invalid_path");
        assert_eq!(json["message"], "Invalid path: ../etc");
    }
}
