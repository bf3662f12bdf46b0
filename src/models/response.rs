//! Uniform JSON response envelope.
//!
//! Every endpoint answers with `{"success": bool, "data": ..., "error": ...}`.
//! Success responses carry `data` and omit `error`; error responses carry a
//! caller-safe `error` string and omit `data`.

use serde::Serialize;

/// Response envelope wrapping every JSON body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful envelope carrying a payload.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Error envelope carrying only a caller-safe message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}
