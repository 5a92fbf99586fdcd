//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.
//!
//! Admission denials (the widget validator's reason codes) are NOT errors:
//! they are expected business outcomes and are modeled as normal responses
//! by the validate handler. `AppError` covers everything else.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Invalid or missing contractor API keys
/// - **Resource Errors**: Widget keys that don't exist or are disabled
/// - **Validation Errors**: Invalid request data (never reaches the store)
/// - **Issuance Errors**: Widget key collision after retry budget exhausted
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// This wraps any sqlx::Error using the `#[from]` attribute, which
    /// automatically implements `From<sqlx::Error> for AppError`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Contractor API key is missing, invalid, or inactive.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// No widget key row matches the supplied token.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Widget key not found")]
    WidgetKeyNotFound,

    /// Widget key exists but has been deactivated by its owner.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Widget key is disabled")]
    WidgetKeyDisabled,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Freshly generated widget key collided with an existing row and the
    /// issuer's retry budget ran out. Astronomically rare at 124 bits of
    /// entropy, surfaced distinctly from generic 500s so callers know a
    /// plain retry will get a fresh key.
    ///
    /// Returns HTTP 500 with `retryable: true`.
    #[error("Widget key collision, retry issuance")]
    KeyCollision,
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "success": false,
///   "error": "Human-readable error message"
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `InvalidApiKey` → 401 Unauthorized
/// - `WidgetKeyNotFound` → 404 Not Found
/// - `WidgetKeyDisabled` → 403 Forbidden
/// - `InvalidRequest` → 400 Bad Request
/// - `KeyCollision` → 500 Internal Server Error (marked retryable)
/// - `Database` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidApiKey => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::WidgetKeyNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::WidgetKeyDisabled => (StatusCode::FORBIDDEN, self.to_string()),
            AppError::InvalidRequest(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::KeyCollision => {
                let body = Json(json!({
                    "success": false,
                    "error": self.to_string(),
                    "retryable": true
                }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred".to_string(),
            ),
        };

        // Build JSON response body
        let body = Json(json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}
