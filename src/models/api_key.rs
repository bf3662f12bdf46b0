//! API key credential model and admin request/response types.
//!
//! A credential is split in two: a public `key_id` used for lookup, and a
//! secret half that is only ever stored as a SHA-256 hash. The composite key
//! string (`yt_<key_id>_<secret>`) exists exactly once, in the response to
//! the admin create call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An API key credential record from the database.
///
/// # Database Table
///
/// Maps to the `api_keys` table:
/// - `id`: store-assigned numeric identity
/// - `key_id`: 32-hex-character public identifier, unique
/// - `key_hash`: SHA-256 hex digest of the secret half; one-way
/// - `name`: operator-assigned label
/// - `is_active`: inactive keys fail verification but keep their history
/// - `rate_limit_per_hour`: positive request quota per rolling hour
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKey {
    pub id: i64,

    /// Public lookup identifier, not secret
    pub key_id: String,

    /// SHA-256 hex digest of the secret half (64 hex characters)
    ///
    /// The plaintext secret is never persisted. Verification hashes the
    /// presented secret and compares digests in constant time.
    pub key_hash: String,

    /// Human-readable label assigned at creation
    pub name: String,

    /// Whether this key currently verifies
    ///
    /// Deactivation revokes access without deleting the record or its
    /// usage history.
    pub is_active: bool,

    /// Maximum requests permitted in any trailing 60-minute window
    pub rate_limit_per_hour: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/v1/admin/keys`.
#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    /// Label for the new key (must be non-empty)
    pub name: String,

    /// Hourly quota; defaults to 100 when omitted
    pub rate_limit_per_hour: Option<i32>,
}

/// Request body for `PATCH /api/v1/admin/keys/{id}`.
///
/// Both fields are optional; omitted fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateKeyRequest {
    pub is_active: Option<bool>,
    pub rate_limit_per_hour: Option<i32>,
}

/// Response to a successful key creation.
///
/// `api_key` is the full composite credential. This is the only time it is
/// ever visible; it cannot be recovered afterwards.
#[derive(Debug, Serialize)]
pub struct CreatedKeyResponse {
    pub id: i64,
    pub key_id: String,

    /// One-time composite credential, `yt_<key_id>_<secret>`
    pub api_key: String,

    pub name: String,
    pub rate_limit_per_hour: i32,
    pub created_at: DateTime<Utc>,
}

/// One key as returned by the admin list endpoint.
///
/// Carries a derived trailing-24-hour usage count and deliberately omits
/// `key_hash`: no secret-derived material leaves the store.
#[derive(Debug, Serialize)]
pub struct KeySummary {
    pub id: i64,
    pub key_id: String,
    pub name: String,
    pub is_active: bool,
    pub rate_limit_per_hour: i32,

    /// Number of gated requests recorded in the last 24 hours
    pub usage_last_24h: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KeySummary {
    pub fn from_key(key: ApiKey, usage_last_24h: i64) -> Self {
        Self {
            id: key.id,
            key_id: key.key_id,
            name: key.name,
            is_active: key.is_active,
            rate_limit_per_hour: key.rate_limit_per_hour,
            usage_last_24h,
            created_at: key.created_at,
            updated_at: key.updated_at,
        }
    }
}
