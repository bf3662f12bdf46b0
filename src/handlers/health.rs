//! Health check endpoint for service monitoring.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::AppError, models::response::ApiResponse, state::AppState};

/// Health check payload.
///
/// Reports service status and store connectivity.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,

    /// Store connection status
    pub database: String,

    pub timestamp: DateTime<Utc>,
}

/// Health check handler. Public, no credential required.
///
/// Pings the backing store with a trivial query; an unreachable store
/// turns into the standard 500 envelope.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthStatus>>, AppError> {
    state.store.ping().await?;

    Ok(Json(ApiResponse::ok(HealthStatus {
        status: "healthy".to_string(),
        database: "connected".to_string(),
        timestamp: Utc::now(),
    })))
}
