//! API DTOs and error mapping

use crate::domain::shared::DomainError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Generic API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Domain error carried to an HTTP response
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            DomainError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("Entity not found: {}", what))
            }
            DomainError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, format!("Unauthorized: {}", msg))
            }
            DomainError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, format!("Validation error: {}", msg))
            }
            DomainError::Conflict(msg) => (StatusCode::CONFLICT, format!("Conflict: {}", msg)),
            DomainError::InvalidStateTransition(msg) => {
                (StatusCode::CONFLICT, format!("Invalid state transition: {}", msg))
            }
            DomainError::ExternalService(detail) => {
                // Upstream detail goes to the log, never to the caller
                error!(detail = %detail, "media control plane error");
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream media service unavailable".to_string(),
                )
            }
            DomainError::Configuration(detail) => {
                error!(detail = %detail, "configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal configuration error".to_string(),
                )
            }
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_envelope() {
        let ok = ApiResponse::success(42);
        assert!(ok.success);
        assert_eq!(ok.data, Some(42));

        let err: ApiResponse<()> = ApiResponse::error("nope".to_string());
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("nope"));
    }

    #[test]
    fn test_external_error_does_not_leak_detail() {
        let response =
            ApiError(DomainError::ExternalService("secret upstream detail".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
