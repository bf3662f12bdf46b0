//! Rate limiting and usage logging.
//!
//! The quota is a rolling 60-minute window: a request is admitted when the
//! count of usage rows inside the trailing hour is below the key's limit.
//! The check and the later usage insert are deliberately not one atomic
//! transaction; concurrent bursts can over-admit slightly. The limit is a
//! documented soft limit, traded for lock-free reads.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::{models::usage::NewUsage, store::KeyStore};

/// Does this key have quota left in the trailing hour?
///
/// Counts usage rows with `request_timestamp >= now - 1h`; rows exactly at
/// the boundary count, older ones do not. Store errors propagate so the
/// caller can fail closed.
pub async fn has_capacity(
    store: &dyn KeyStore,
    api_key_id: i64,
    limit_per_hour: i32,
) -> Result<bool, sqlx::Error> {
    let window_start = Utc::now() - Duration::hours(1);
    let count = store.count_usage_since(api_key_id, window_start).await?;

    Ok(count < i64::from(limit_per_hour))
}

/// Record one gated request, best-effort.
///
/// The insert runs on a detached task so it can never delay or fail the
/// response already on its way out. Failures are logged server-side and
/// dropped; usage logging is observability, not correctness.
pub fn record(store: Arc<dyn KeyStore>, usage: NewUsage) {
    tokio::spawn(async move {
        if let Err(err) = store.insert_usage(usage).await {
            tracing::warn!(error = %err, "failed to record API usage");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MemoryKeyStore;

    async fn seeded_key(store: &MemoryKeyStore, limit: i32) -> i64 {
        store.seed_key("a".repeat(32).as_str(), "hash", "test", limit, true).await
    }

    #[tokio::test]
    async fn under_limit_has_capacity() {
        let store = MemoryKeyStore::new();
        let key_id = seeded_key(&store, 100).await;

        for _ in 0..99 {
            store.seed_usage(key_id, "/api/v1/video-info", 200, 0).await;
        }

        assert!(has_capacity(&store, key_id, 100).await.unwrap());
    }

    #[tokio::test]
    async fn at_limit_has_no_capacity() {
        let store = MemoryKeyStore::new();
        let key_id = seeded_key(&store, 100).await;

        for _ in 0..100 {
            store.seed_usage(key_id, "/api/v1/video-info", 200, 0).await;
        }

        assert!(!has_capacity(&store, key_id, 100).await.unwrap());
    }

    #[tokio::test]
    async fn rows_older_than_an_hour_are_excluded() {
        let store = MemoryKeyStore::new();
        let key_id = seeded_key(&store, 100).await;

        // 100 rows timestamped 61 minutes ago fall outside the window
        for _ in 0..100 {
            store.seed_usage(key_id, "/api/v1/video-info", 200, 61).await;
        }

        assert!(has_capacity(&store, key_id, 100).await.unwrap());

        // One more inside the window still leaves 99 < 100
        store.seed_usage(key_id, "/api/v1/video-info", 200, 0).await;
        assert!(has_capacity(&store, key_id, 100).await.unwrap());
    }

    #[tokio::test]
    async fn store_error_propagates() {
        let store = MemoryKeyStore::new();
        let key_id = seeded_key(&store, 100).await;
        store.set_failing(true);

        assert!(has_capacity(&store, key_id, 100).await.is_err());
    }

    #[tokio::test]
    async fn record_writes_a_row() {
        let store = Arc::new(MemoryKeyStore::new());
        let key_id = seeded_key(&store, 100).await;

        record(
            store.clone(),
            NewUsage {
                api_key_id: key_id,
                endpoint: "/api/v1/video-info".to_string(),
                response_status: 200,
                processing_time_ms: Some(12),
                error_message: None,
            },
        );

        // Let the detached insert run
        tokio::task::yield_now().await;

        let count = store
            .count_usage_since(key_id, Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn record_swallows_store_errors() {
        let store = Arc::new(MemoryKeyStore::new());
        let key_id = seeded_key(&store, 100).await;
        store.set_failing(true);

        // Must not panic or surface anything
        record(
            store.clone(),
            NewUsage {
                api_key_id: key_id,
                endpoint: "/api/v1/video-info".to_string(),
                response_status: 200,
                processing_time_ms: None,
                error_message: None,
            },
        );

        tokio::task::yield_now().await;
    }
}
