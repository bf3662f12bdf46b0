//! Credential management HTTP handlers (admin-gated).
//!
//! - `POST /api/v1/admin/keys` - issue a key, returning the one-time secret
//! - `GET /api/v1/admin/keys` - list keys with 24-hour usage counts
//! - `PATCH /api/v1/admin/keys/{id}` - activate/deactivate, change quota
//! - `DELETE /api/v1/admin/keys/{id}` - delete a key and its usage history
//!
//! All of these sit behind the admin guard middleware; none of them is
//! reachable with a caller API key.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{Duration, Utc};

use crate::{
    error::AppError,
    models::{
        api_key::{CreateKeyRequest, CreatedKeyResponse, KeySummary, UpdateKeyRequest},
        response::ApiResponse,
    },
    services::key_service,
    state::AppState,
};

/// Hourly quota applied when the create request does not name one.
const DEFAULT_RATE_LIMIT_PER_HOUR: i32 = 100;

/// Issue a new API key.
///
/// The response carries the full composite credential. It is shown exactly
/// once: only its public id and the digest of its secret are persisted, so
/// it cannot be redisplayed later.
pub async fn create_key(
    State(state): State<AppState>,
    Json(request): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedKeyResponse>>), AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest("Name must not be empty".to_string()));
    }

    let rate_limit = request
        .rate_limit_per_hour
        .unwrap_or(DEFAULT_RATE_LIMIT_PER_HOUR);
    if rate_limit <= 0 {
        return Err(AppError::InvalidRequest(
            "rate_limit_per_hour must be positive".to_string(),
        ));
    }

    let generated = key_service::generate();
    let record = state
        .store
        .insert_credential(&generated.key_id, &generated.key_hash, name, rate_limit)
        .await?;

    let response = CreatedKeyResponse {
        id: record.id,
        key_id: record.key_id,
        api_key: generated.api_key,
        name: record.name,
        rate_limit_per_hour: record.rate_limit_per_hour,
        created_at: record.created_at,
    };

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(response))))
}

/// List all keys, newest first, each with its usage count over the trailing
/// 24 hours. Secrets and hashes never appear here.
pub async fn list_keys(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<KeySummary>>>, AppError> {
    let since = Utc::now() - Duration::hours(24);
    let keys = state.store.list_with_usage(since).await?;

    let summaries = keys
        .into_iter()
        .map(|(key, usage)| KeySummary::from_key(key, usage))
        .collect();

    Ok(Json(ApiResponse::ok(summaries)))
}

/// Update a key's active flag and/or hourly quota.
pub async fn update_key(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateKeyRequest>,
) -> Result<Json<ApiResponse<KeySummary>>, AppError> {
    if let Some(limit) = request.rate_limit_per_hour {
        if limit <= 0 {
            return Err(AppError::InvalidRequest(
                "rate_limit_per_hour must be positive".to_string(),
            ));
        }
    }

    let updated = state
        .store
        .update_credential(id, request.is_active, request.rate_limit_per_hour)
        .await?
        .ok_or(AppError::KeyNotFound)?;

    let since = Utc::now() - Duration::hours(24);
    let usage = state.store.count_usage_since(updated.id, since).await?;

    Ok(Json(ApiResponse::ok(KeySummary::from_key(updated, usage))))
}

/// Delete a key. The cascading foreign key removes its usage history with it.
pub async fn delete_key(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let deleted = state.store.delete_credential(id).await?;
    if !deleted {
        return Err(AppError::KeyNotFound);
    }

    Ok(Json(ApiResponse::ok(serde_json::json!({ "deleted_id": id }))))
}
