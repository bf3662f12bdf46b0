//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses carrying the standard `{success, error}` envelope.
//! No internal detail (queries, upstream bodies, stack traces) ever reaches
//! a response body; the `error` field carries only a caller-safe message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::models::response::ApiResponse;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Validation**: malformed credential string or request body → 400/401
/// - **Authentication**: unknown/inactive key, bad admin token → 401/403
/// - **Rate limiting**: quota exhausted → 429
/// - **Configuration**: admin secret unset at startup → 500
/// - **Persistence**: store failures → 500 (security-deciding paths map
///   these to a fail-closed 401 before they ever become an `AppError`)
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed outside a security-deciding path.
    ///
    /// Verification and admin-token checks never surface this variant;
    /// they fail closed instead. Returns HTTP 500 with a generic message.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No API key header was presented, or it did not parse.
    ///
    /// Returns HTTP 401 with format guidance.
    #[error("API key required. Provide it as: X-API-Key: yt_<keyId>_<secret>")]
    ApiKeyRequired,

    /// The key parsed but is unknown, inactive, or its secret is wrong.
    ///
    /// One uniform message for all three cases, so a caller cannot probe
    /// which keys exist. Returns HTTP 401.
    #[error("Invalid or inactive API key")]
    InvalidApiKey,

    /// Hourly quota exhausted. Returns HTTP 429; the message embeds the
    /// numeric limit so callers can size their backoff.
    #[error("Rate limit exceeded: {limit} requests per hour")]
    RateLimitExceeded { limit: i32 },

    /// Admin endpoint called without any operator token. Returns HTTP 401.
    #[error("Admin token required")]
    AdminTokenRequired,

    /// Admin endpoint called with a wrong operator token. Returns HTTP 403.
    ///
    /// Distinguishable from the missing-token case on purpose; this is an
    /// operator-facing surface, not a public one.
    #[error("Invalid admin token")]
    AdminTokenInvalid,

    /// No operator secret was configured at startup.
    ///
    /// Every admin request fails with HTTP 500 until the deployment is
    /// fixed; misconfiguration never becomes an open admin surface.
    #[error("Admin access is not configured on this server")]
    AdminNotConfigured,

    /// Request body or URL is invalid. Returns HTTP 400.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// Requested record does not exist. Returns HTTP 404.
    #[error("API key not found")]
    KeyNotFound,

    /// Upstream metadata fetch failed. Returns HTTP 500; the upstream
    /// error detail stays in the server log.
    #[error("Failed to fetch video metadata")]
    MetadataFetch,
}

/// Convert AppError into an HTTP response.
///
/// Allows handlers to return `Result<T, AppError>` and have errors become
/// proper envelope responses automatically.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::ApiKeyRequired | AppError::InvalidApiKey | AppError::AdminTokenRequired => {
                StatusCode::UNAUTHORIZED
            }
            AppError::AdminTokenInvalid => StatusCode::FORBIDDEN,
            AppError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::KeyNotFound => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::AdminNotConfigured | AppError::MetadataFetch => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            // Hide database detail from clients
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                "An internal error occurred".to_string()
            }
            AppError::InvalidRequest(msg) => msg.clone(),
            other => other.to_string(),
        };

        (status, Json(ApiResponse::err(message))).into_response()
    }
}
