//! Operator admin guard.
//!
//! A single shared operator secret, distinct from per-caller API keys, gates
//! the credential-management endpoints. The expected value is loaded once at
//! startup and injected here; if it was never configured, every admin
//! request fails with a server error. Misconfiguration must not silently
//! become an open admin surface.
//!
//! Unlike caller verification, the missing-token (401) and wrong-token (403)
//! cases are deliberately distinguishable: this surface faces operators, not
//! the public.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

use crate::{error::AppError, services::key_service::constant_time_eq, state::AppState};

/// Dedicated operator header; `Authorization: Bearer` is accepted as well.
const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Validates the operator secret on admin requests.
pub struct AdminGuard {
    /// SHA-256 digest of the configured secret, or `None` when unset.
    ///
    /// Comparing digests keeps both sides at a fixed 32 bytes, so the
    /// constant-time comparison never short-circuits on length.
    expected_digest: Option<[u8; 32]>,
}

impl AdminGuard {
    /// Build a guard around the secret loaded at startup. An empty string
    /// counts as unconfigured.
    pub fn new(token: Option<String>) -> Self {
        let expected_digest = token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| Sha256::digest(t.as_bytes()).into());

        Self { expected_digest }
    }

    /// Check the presented token against the configured secret.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let expected = match self.expected_digest {
            Some(expected) => expected,
            None => {
                // Deployment defect, so be loud; but only this request fails
                tracing::error!("ADMIN_TOKEN is not configured; rejecting admin request");
                return Err(AppError::AdminNotConfigured);
            }
        };

        let presented = extract_admin_token(headers).ok_or(AppError::AdminTokenRequired)?;
        let presented_digest: [u8; 32] = Sha256::digest(presented.as_bytes()).into();

        if constant_time_eq(&presented_digest, &expected) {
            Ok(())
        } else {
            Err(AppError::AdminTokenInvalid)
        }
    }
}

/// Middleware protecting the admin route group.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    state.admin.authorize(request.headers())?;
    Ok(next.run(request).await)
}

/// Pull the operator token from `X-Admin-Token`, falling back to
/// `Authorization: Bearer <token>`.
fn extract_admin_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get(ADMIN_TOKEN_HEADER).and_then(|h| h.to_str().ok()) {
        return Some(token);
    }

    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}
