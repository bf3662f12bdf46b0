//! Data models representing database entities and API request/response types.

/// API key credential model and admin DTOs
pub mod api_key;
/// JSON response envelope
pub mod response;
/// Per-request usage log model
pub mod usage;
/// Video metadata types
pub mod video;
