//! Video metadata HTTP handlers.
//!
//! The same handler serves both routes:
//! - `POST /api/v1/video-info` (API surface, key required)
//! - `POST /api/video-info` (UI-facing, anonymous access allowed)
//!
//! Which credentials are acceptable is decided entirely by the middleware
//! layered onto each route; the handler itself only validates the URL and
//! delegates to the metadata fetcher.

use axum::{Json, extract::State};

use crate::{
    error::AppError,
    models::{response::ApiResponse, video::{VideoInfoRequest, VideoMetadata}},
    services::metadata_service,
    state::AppState,
};

/// Resolve metadata for a YouTube video URL.
///
/// # Responses
///
/// - **200**: `{success: true, data: {title, author_name, ...}}`
/// - **400**: URL is malformed or not a YouTube video
/// - **401/429**: rejected by the auth middleware before reaching here
/// - **500**: upstream fetch failed (detail stays in the server log)
pub async fn video_info(
    State(state): State<AppState>,
    Json(request): Json<VideoInfoRequest>,
) -> Result<Json<ApiResponse<VideoMetadata>>, AppError> {
    let url =
        metadata_service::validate_video_url(&request.url).map_err(AppError::InvalidRequest)?;

    let metadata = state.fetcher.fetch(&url).await.map_err(|err| {
        tracing::error!(error = %err, url = %url, "metadata fetch failed");
        AppError::MetadataFetch
    })?;

    Ok(Json(ApiResponse::ok(metadata)))
}
