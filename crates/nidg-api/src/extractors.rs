//! Request extraction helpers.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Domain-level request validation, applied after deserialization.
pub trait Validate {
    /// Check field formats; the error string becomes the 422 message.
    fn validate(&self) -> Result<(), String>;
}

/// Unwrap an axum JSON extraction and run domain validation.
///
/// Deserialization failures map to `BadRequest`, validation failures to
/// `Validation`; both answer 422 on the wire.
pub fn extract_validated_json<T: Validate>(
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let Json(value) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    value.validate().map_err(AppError::Validation)?;
    Ok(value)
}
