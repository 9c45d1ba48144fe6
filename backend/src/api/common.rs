//! Error handling utilities for API responses.
//!
//! Provides structured error responses and conversion between service-layer errors
//! and HTTP responses. Includes:
//! - Standard response envelope
//! - ServiceError to HTTP status code mapping
//! - Validation error formatting
//!
//! # Response Format
//! All errors return consistent JSON responses containing:
//! - `message`: Human-readable message
//! - `error.error_type`: Machine-readable error category
//! - `error.details`: Optional field-specific validation errors

use crate::connectors::Download;
use crate::errors::ServiceError;
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Standard API response wrapper for all endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    pub message: String,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Request timestamp
    pub timestamp: String,
}

/// Error details for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error type identifier
    pub error_type: String,
    /// Field-specific validation errors when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-specific validation error details
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the field with validation error
    pub field: String,
    /// Description of the validation failure
    pub message: String,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a successful response with default message
    pub fn ok(data: T) -> Self {
        Self::success(data, "Request successful")
    }

    /// Create an error response
    pub fn error(
        message: impl Into<String>,
        error_type: impl Into<String>,
        details: Option<Vec<FieldError>>,
    ) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: message.into(),
            error: Some(ErrorDetails {
                error_type: error_type.into(),
                details,
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Builds an error response outside of the `ServiceError` flow.
pub fn api_error(status: StatusCode, error_type: &str, message: impl Into<String>) -> ApiError {
    (status, Json(ApiResponse::<()>::error(message, error_type, None)))
}

/// Body returned by endpoints that hand out an upstream link. `url` is null
/// when the upstream could not provide one.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub url: Option<String>,
}

/// Streams an upstream file back to the browser for inline display.
pub fn file_response(download: Download, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, download.content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{file_name}\""),
            ),
        ],
        download.bytes,
    )
        .into_response()
}

/// Converts ServiceError to appropriate HTTP response with standard format
pub fn service_error_to_http(error: ServiceError) -> ApiError {
    let (status, error_type, message, details) = match error {
        ServiceError::Validation { message, fields } => {
            let details = (!fields.is_empty()).then(|| {
                fields
                    .into_iter()
                    .map(|(field, message)| FieldError { field, message })
                    .collect()
            });
            (StatusCode::BAD_REQUEST, "validation_error", message, details)
        }
        ServiceError::Unauthorized { message } => {
            (StatusCode::UNAUTHORIZED, "unauthorized", message, None)
        }
        ServiceError::RateLimited { message } => {
            (StatusCode::TOO_MANY_REQUESTS, "rate_limited", message, None)
        }
        ServiceError::NotFound { entity, identifier } => (
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{} '{}' not found", entity, identifier),
            None,
        ),
        ServiceError::PermissionDenied { message } => {
            (StatusCode::FORBIDDEN, "permission_denied", message, None)
        }
        ServiceError::Database { source } => {
            tracing::error!("Database error: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Internal server error".to_string(),
                None,
            )
        }
        ServiceError::InternalError { message } => {
            tracing::error!("Internal error: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
                None,
            )
        }
    };

    (
        status,
        Json(ApiResponse::<()>::error(message, error_type, details)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::validation("bad"), StatusCode::BAD_REQUEST),
            (ServiceError::unauthorized("no"), StatusCode::UNAUTHORIZED),
            (ServiceError::rate_limited("slow"), StatusCode::TOO_MANY_REQUESTS),
            (ServiceError::not_found("Ticket", "t1"), StatusCode::NOT_FOUND),
            (ServiceError::permission_denied("no"), StatusCode::FORBIDDEN),
            (ServiceError::internal_error("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            let (status, _) = service_error_to_http(error);
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let (_, Json(body)) = service_error_to_http(ServiceError::Database {
            source: anyhow::anyhow!("disk I/O error at /var/db"),
        });
        assert_eq!(body.message, "Internal server error");
        assert!(!body.success);
    }

    #[test]
    fn test_file_response_headers() {
        let response = file_response(
            Download {
                bytes: b"%PDF-1.4".to_vec(),
                content_type: "application/pdf".to_string(),
            },
            "q1.pdf",
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "inline; filename=\"q1.pdf\""
        );
    }

    #[test]
    fn test_field_errors_are_exposed() {
        let error = ServiceError::Validation {
            message: "subject: too short".to_string(),
            fields: vec![("subject".to_string(), "too short".to_string())],
        };
        let (_, Json(body)) = service_error_to_http(error);
        let details = body.error.unwrap().details.unwrap();
        assert_eq!(details[0].field, "subject");
    }
}
