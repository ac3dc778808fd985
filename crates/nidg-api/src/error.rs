//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from the registry client and the core newtypes to
//! HTTP status codes, with JSON error bodies carrying a machine-readable
//! code. Internal and upstream error details are never exposed in
//! responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use nidg_registry_client::RegistryError;

/// Structured JSON error response body.
///
/// All error responses use this format across the API surface.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request field validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (422). The client sent
    /// syntactically valid HTTP but semantically invalid content, so it
    /// shares the 422 status with `Validation`.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Caller address is not on the system allowlist (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500). Message is logged but not returned
    /// to the client.
    #[error("internal error: {0}")]
    Internal(String),

    /// The registry rejected the call or answered with garbage (502).
    /// Message is logged but not returned to the client.
    #[error("upstream registry error: {0}")]
    UpstreamError(String),

    /// A required collaborator is not configured or unreachable (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "BAD_REQUEST"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::UpstreamError(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }

    /// Construct a service unavailable error (503).
    pub fn service_unavailable(msg: &str) -> Self {
        Self::ServiceUnavailable(msg.to_string())
    }

    /// Construct an upstream error (502 Bad Gateway).
    pub fn upstream(msg: String) -> Self {
        Self::UpstreamError(msg)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal/upstream error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::UpstreamError(_) => "An upstream registry error occurred".to_string(),
            other => other.to_string(),
        };

        // Log server-side errors for operator visibility.
        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::UpstreamError(_) => tracing::error!(error = %self, "upstream registry error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convert core validation errors to API errors.
impl From<nidg_core::ValidationError> for AppError {
    fn from(err: nidg_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Convert registry client errors to API errors.
///
/// A conditional mismatch never reaches this conversion: it is a
/// successful verification result, not an error.
impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match &err {
            RegistryError::Authentication { .. } | RegistryError::VerificationFailed { .. } => {
                Self::UpstreamError(err.to_string())
            }
            RegistryError::ServiceUnavailable { .. } => Self::ServiceUnavailable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_status_code() {
        let err = AppError::Validation("bad field".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "VALIDATION_ERROR");
    }

    #[test]
    fn bad_request_status_code() {
        let err = AppError::BadRequest("malformed JSON".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "BAD_REQUEST");
    }

    #[test]
    fn forbidden_status_code() {
        let err = AppError::Forbidden("not registered".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(code, "FORBIDDEN");
    }

    #[test]
    fn upstream_error_status_code() {
        let err = AppError::UpstreamError("registry timeout".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "UPSTREAM_ERROR");
    }

    #[test]
    fn service_unavailable_status_code() {
        let err = AppError::ServiceUnavailable("registry client not configured".to_string());
        let (status, code) = err.status_and_code();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "SERVICE_UNAVAILABLE");
    }

    #[test]
    fn registry_errors_map_to_gateway_statuses() {
        let err = AppError::from(RegistryError::Authentication {
            status: 403,
            body: "denied".into(),
        });
        assert!(matches!(err, AppError::UpstreamError(_)));

        let err = AppError::from(RegistryError::VerificationFailed {
            status: 422,
            body: "rejected".into(),
        });
        assert!(matches!(err, AppError::UpstreamError(_)));

        let err = AppError::from(RegistryError::ServiceUnavailable {
            reason: "down".into(),
        });
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
    }

    #[test]
    fn validation_error_from_core() {
        let core_err = nidg_core::ValidationError::InvalidNid("123".to_string());
        let app_err = AppError::from(core_err);
        match &app_err {
            AppError::Validation(msg) => assert!(msg.contains("123")),
            other => panic!("expected Validation, got: {other:?}"),
        }
    }

    // ── into_response tests ──────────────────────────────────────

    use http_body_util::BodyExt;

    /// Helper to extract status and body from a Response.
    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn into_response_validation() {
        let (status, body) = response_parts(AppError::Validation("bad nid".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.code, "VALIDATION_ERROR");
        assert!(body.error.message.contains("bad nid"));
    }

    #[tokio::test]
    async fn into_response_internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("db connection failed".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(
            !body.error.message.contains("db connection"),
            "internal error details must not leak: {}",
            body.error.message
        );
    }

    #[tokio::test]
    async fn into_response_upstream_hides_details() {
        let (status, body) =
            response_parts(AppError::UpstreamError("registry said 500: secret".into())).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error.code, "UPSTREAM_ERROR");
        assert!(!body.error.message.contains("secret"));
    }
}
