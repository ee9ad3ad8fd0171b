//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured error variants.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Aperture core error - error from the matching library
    #[error("Aperture error: {0}")]
    Aperture(#[from] aperture_core::ApertureError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Aperture(ref e) => match e {
                // Client-provided invalid input → 400
                aperture_core::ApertureError::ImageDecode(_)
                | aperture_core::ApertureError::InvalidEntry { .. } => StatusCode::BAD_REQUEST,

                // Missing resources → 404
                aperture_core::ApertureError::NotFound(_) => StatusCode::NOT_FOUND,

                // Internal processing failures → 500
                aperture_core::ApertureError::ImageEncode(_)
                | aperture_core::ApertureError::FeatureExtraction(_)
                | aperture_core::ApertureError::CounterCorrupt(_)
                | aperture_core::ApertureError::Storage(_)
                | aperture_core::ApertureError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Aperture(ref e) => match e {
                aperture_core::ApertureError::ImageDecode(_) => "IMAGE_DECODE_FAILED",
                aperture_core::ApertureError::ImageEncode(_) => "IMAGE_ENCODE_FAILED",
                aperture_core::ApertureError::InvalidEntry { .. } => "INVALID_ENTRY",
                aperture_core::ApertureError::NotFound(_) => "NOT_FOUND",
                aperture_core::ApertureError::FeatureExtraction(_) => "FEATURE_EXTRACTION_FAILED",
                aperture_core::ApertureError::CounterCorrupt(_) => "COUNTER_CORRUPT",
                aperture_core::ApertureError::Storage(_) => "STORAGE_ERROR",
                aperture_core::ApertureError::Io(_) => "IO_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // For core errors, sanitize internal details
            Self::Aperture(ref e) => match e {
                aperture_core::ApertureError::ImageDecode(_) => {
                    "Could not decode the submitted image".to_string()
                }
                aperture_core::ApertureError::ImageEncode(_) => {
                    "Image encoding failed".to_string()
                }
                aperture_core::ApertureError::InvalidEntry { key, .. } => {
                    format!("Annotation entry {} is invalid", key)
                }
                aperture_core::ApertureError::NotFound(what) => {
                    format!("{} not found", what)
                }
                aperture_core::ApertureError::FeatureExtraction(_) => {
                    "Feature extraction failed".to_string()
                }
                aperture_core::ApertureError::CounterCorrupt(_) => {
                    "Ingestion counter is corrupt".to_string()
                }
                aperture_core::ApertureError::Storage(_) => "Storage error".to_string(),
                aperture_core::ApertureError::Io(_) => "I/O error".to_string(),
            },
            // For other errors, use the Display message
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
            Self::Aperture(_) => "aperture",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_client_error() {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        } else {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                client_message = %client_message,
                "Server error"
            );
        }

        // All error responses include a `code` field for programmatic error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_maps_to_bad_request() {
        let err = ApiError::from(aperture_core::ApertureError::ImageDecode(
            "bad jpeg".to_string(),
        ));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "IMAGE_DECODE_FAILED");
    }

    #[test]
    fn test_storage_error_is_internal() {
        let err = ApiError::from(aperture_core::ApertureError::Storage(
            "disk full".to_string(),
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_client_message_hides_internals() {
        let err = ApiError::from(aperture_core::ApertureError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/secret/path",
        )));
        assert!(!err.client_message().contains("/secret/path"));
    }
}
