//! Per-request usage log model.
//!
//! One row is written for every gated request whose credential resolved,
//! including quota-rejected ones. Rows are immutable and feed the rolling
//! rate-limit window; deleting a key cascades its rows away.

use chrono::{DateTime, Utc};

/// A usage log record from the `api_usage` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiUsage {
    pub id: i64,

    /// Owning credential; cascade-deleted with it
    pub api_key_id: i64,

    /// Request path, e.g. `/api/v1/video-info`
    pub endpoint: String,

    pub request_timestamp: DateTime<Utc>,

    /// HTTP status the caller received
    pub response_status: i32,

    /// Wall-clock handling time, when measured
    pub processing_time_ms: Option<i32>,

    /// Caller-safe error message for non-2xx outcomes
    pub error_message: Option<String>,
}

/// Fields for inserting a new usage row.
///
/// `request_timestamp` is assigned by the store at insert time.
#[derive(Debug, Clone)]
pub struct NewUsage {
    pub api_key_id: i64,
    pub endpoint: String,
    pub response_status: i32,
    pub processing_time_ms: Option<i32>,
    pub error_message: Option<String>,
}
