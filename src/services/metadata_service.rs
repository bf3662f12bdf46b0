//! Video metadata fetching.
//!
//! Metadata extraction itself is an external concern: the rest of the
//! server only sees the [`MetadataFetcher`] capability. Production uses
//! YouTube's public oEmbed endpoint; tests substitute a stub.

use async_trait::async_trait;

use crate::models::video::VideoMetadata;

/// Hosts we accept video URLs for.
const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtu.be",
];

/// Opaque metadata lookup: URL in, metadata or error out.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, video_url: &str) -> anyhow::Result<VideoMetadata>;
}

/// Validate that a candidate string is a well-formed YouTube video URL.
///
/// Returns the canonicalized URL string, or a caller-safe description of
/// what is wrong with it.
pub fn validate_video_url(candidate: &str) -> Result<String, String> {
    let parsed = url::Url::parse(candidate).map_err(|_| "Invalid URL format".to_string())?;

    match parsed.scheme() {
        "http" | "https" => {}
        _ => return Err("URL must use HTTP or HTTPS".to_string()),
    }

    let host = parsed.host_str().ok_or_else(|| "URL has no host".to_string())?;
    if !YOUTUBE_HOSTS.contains(&host) {
        return Err("URL must point to a YouTube video".to_string());
    }

    Ok(parsed.into())
}

/// [`MetadataFetcher`] backed by YouTube's oEmbed endpoint.
pub struct OembedFetcher {
    client: reqwest::Client,
}

impl OembedFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl MetadataFetcher for OembedFetcher {
    async fn fetch(&self, video_url: &str) -> anyhow::Result<VideoMetadata> {
        let response = self
            .client
            .get("https://www.youtube.com/oembed")
            .query(&[("url", video_url), ("format", "json")])
            .send()
            .await?
            .error_for_status()?;

        let metadata = response.json::<VideoMetadata>().await?;
        Ok(metadata)
    }
}
