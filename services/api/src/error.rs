//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it maps
//! onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coaching_core::ports::PortError;
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the core store or orchestrators.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Login with an unknown email or a wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Port(PortError::BadRequest(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Port(PortError::BadRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Port(PortError::Unauthenticated) | ApiError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Port(PortError::Conflict(_)) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Port(PortError::NotFound(message))
            | ApiError::Port(PortError::BadRequest(message))
            | ApiError::Port(PortError::Conflict(message))
            | ApiError::Port(PortError::ExternalService(message)) => message.clone(),
            ApiError::Port(PortError::Unauthenticated) => "Authentication required".to_string(),
            ApiError::InvalidCredentials => "Invalid credentials".to_string(),
            _ => {
                error!("Internal error while handling request: {:?}", self);
                "An unexpected error occurred".to_string()
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (PortError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (PortError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (PortError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (PortError::Conflict("x".into()), StatusCode::CONFLICT),
            (PortError::ExternalService("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (PortError::Unexpected("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (port_error, status) in cases {
            assert_eq!(ApiError::from(port_error).status(), status);
        }
    }

    #[tokio::test]
    async fn unexpected_errors_do_not_leak_details() {
        let response =
            ApiError::Port(PortError::Unexpected("lock poisoned at 0xdead".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("0xdead"));
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json, json!({ "message": "An unexpected error occurred" }));
    }
}
