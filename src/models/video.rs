//! Video metadata request/response types.

use serde::{Deserialize, Serialize};

/// Request body for the video-info endpoints.
#[derive(Debug, Deserialize)]
pub struct VideoInfoRequest {
    /// YouTube video URL (watch page, short link, or embed form)
    pub url: String,
}

/// Metadata for a single video, as resolved by the upstream oEmbed fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub author_name: String,

    #[serde(default)]
    pub author_url: Option<String>,

    #[serde(default)]
    pub thumbnail_url: Option<String>,

    #[serde(default)]
    pub provider_name: Option<String>,
}
