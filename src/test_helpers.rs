//! Shared test fixtures: an in-memory `KeyStore` fake, a stub metadata
//! fetcher, and router builders wired to both.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Duration, Utc};

use crate::{
    middleware::admin::AdminGuard,
    models::{
        api_key::ApiKey,
        usage::{ApiUsage, NewUsage},
        video::VideoMetadata,
    },
    services::{key_service, metadata_service::MetadataFetcher},
    state::AppState,
    store::KeyStore,
};

/// In-memory [`KeyStore`] with seeding helpers and a fail switch for
/// exercising the fail-closed and fail-open store-error paths.
#[derive(Default)]
pub struct MemoryKeyStore {
    inner: Mutex<Inner>,
    failing: AtomicBool,
}

#[derive(Default)]
struct Inner {
    keys: Vec<ApiKey>,
    usage: Vec<ApiUsage>,
    next_key_id: i64,
    next_usage_id: i64,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every store operation fails.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_failing(&self) -> Result<(), sqlx::Error> {
        if self.failing.load(Ordering::SeqCst) {
            Err(sqlx::Error::PoolClosed)
        } else {
            Ok(())
        }
    }

    /// Insert a key directly, bypassing the trait. Returns the assigned id.
    pub async fn seed_key(
        &self,
        key_id: &str,
        key_hash: &str,
        name: &str,
        rate_limit_per_hour: i32,
        is_active: bool,
    ) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        inner.next_key_id += 1;
        let id = inner.next_key_id;
        let now = Utc::now();
        inner.keys.push(ApiKey {
            id,
            key_id: key_id.to_string(),
            key_hash: key_hash.to_string(),
            name: name.to_string(),
            is_active,
            rate_limit_per_hour,
            created_at: now,
            updated_at: now,
        });
        id
    }

    /// Insert a usage row timestamped `minutes_ago` in the past.
    pub async fn seed_usage(
        &self,
        api_key_id: i64,
        endpoint: &str,
        response_status: i32,
        minutes_ago: i64,
    ) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_usage_id += 1;
        let id = inner.next_usage_id;
        inner.usage.push(ApiUsage {
            id,
            api_key_id,
            endpoint: endpoint.to_string(),
            request_timestamp: Utc::now() - Duration::minutes(minutes_ago),
            response_status,
            processing_time_ms: None,
            error_message: None,
        });
    }

    pub async fn usage_rows(&self, api_key_id: i64) -> Vec<ApiUsage> {
        self.inner
            .lock()
            .unwrap()
            .usage
            .iter()
            .filter(|u| u.api_key_id == api_key_id)
            .cloned()
            .collect()
    }

    /// Direct active-only lookup, ignoring the fail switch.
    pub async fn find_active(&self, key_id: &str) -> Option<ApiKey> {
        self.inner
            .lock()
            .unwrap()
            .keys
            .iter()
            .find(|k| k.key_id == key_id && k.is_active)
            .cloned()
    }

    /// Direct by-id lookup, ignoring the fail switch.
    pub async fn find_by_id_raw(&self, id: i64) -> Option<ApiKey> {
        self.inner
            .lock()
            .unwrap()
            .keys
            .iter()
            .find(|k| k.id == id)
            .cloned()
    }

    /// Direct usage count, ignoring the fail switch.
    pub async fn count_usage_since_raw(&self, api_key_id: i64, since: DateTime<Utc>) -> i64 {
        self.inner
            .lock()
            .unwrap()
            .usage
            .iter()
            .filter(|u| u.api_key_id == api_key_id && u.request_timestamp >= since)
            .count() as i64
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn find_active_by_key_id(&self, key_id: &str) -> Result<Option<ApiKey>, sqlx::Error> {
        self.check_failing()?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .keys
            .iter()
            .find(|k| k.key_id == key_id && k.is_active)
            .cloned())
    }

    async fn insert_credential(
        &self,
        key_id: &str,
        key_hash: &str,
        name: &str,
        rate_limit_per_hour: i32,
    ) -> Result<ApiKey, sqlx::Error> {
        self.check_failing()?;
        let id = self
            .seed_key(key_id, key_hash, name, rate_limit_per_hour, true)
            .await;
        Ok(self.find_by_id_raw(id).await.unwrap())
    }

    async fn update_credential(
        &self,
        id: i64,
        is_active: Option<bool>,
        rate_limit_per_hour: Option<i32>,
    ) -> Result<Option<ApiKey>, sqlx::Error> {
        self.check_failing()?;
        let mut inner = self.inner.lock().unwrap();
        let Some(key) = inner.keys.iter_mut().find(|k| k.id == id) else {
            return Ok(None);
        };
        if let Some(active) = is_active {
            key.is_active = active;
        }
        if let Some(limit) = rate_limit_per_hour {
            key.rate_limit_per_hour = limit;
        }
        key.updated_at = Utc::now();
        Ok(Some(key.clone()))
    }

    async fn delete_credential(&self, id: i64) -> Result<bool, sqlx::Error> {
        self.check_failing()?;
        let mut inner = self.inner.lock().unwrap();
        let before = inner.keys.len();
        inner.keys.retain(|k| k.id != id);
        let existed = inner.keys.len() < before;
        if existed {
            // Mirror the cascading foreign key
            inner.usage.retain(|u| u.api_key_id != id);
        }
        Ok(existed)
    }

    async fn list_with_usage(
        &self,
        usage_since: DateTime<Utc>,
    ) -> Result<Vec<(ApiKey, i64)>, sqlx::Error> {
        self.check_failing()?;
        let inner = self.inner.lock().unwrap();
        let mut keys: Vec<ApiKey> = inner.keys.clone();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(keys
            .into_iter()
            .map(|k| {
                let count = inner
                    .usage
                    .iter()
                    .filter(|u| u.api_key_id == k.id && u.request_timestamp >= usage_since)
                    .count() as i64;
                (k, count)
            })
            .collect())
    }

    async fn count_usage_since(
        &self,
        api_key_id: i64,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        self.check_failing()?;
        Ok(self.count_usage_since_raw(api_key_id, since).await)
    }

    async fn insert_usage(&self, usage: NewUsage) -> Result<(), sqlx::Error> {
        self.check_failing()?;
        let mut inner = self.inner.lock().unwrap();
        inner.next_usage_id += 1;
        let id = inner.next_usage_id;
        inner.usage.push(ApiUsage {
            id,
            api_key_id: usage.api_key_id,
            endpoint: usage.endpoint,
            request_timestamp: Utc::now(),
            response_status: usage.response_status,
            processing_time_ms: usage.processing_time_ms,
            error_message: usage.error_message,
        });
        Ok(())
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        self.check_failing()
    }
}

/// Fetcher returning fixed metadata without touching the network.
pub struct StubFetcher;

#[async_trait]
impl MetadataFetcher for StubFetcher {
    async fn fetch(&self, _video_url: &str) -> anyhow::Result<VideoMetadata> {
        Ok(VideoMetadata {
            title: "Stub Video".to_string(),
            author_name: "Stub Author".to_string(),
            author_url: None,
            thumbnail_url: Some("https://i.ytimg.com/vi/stub/hqdefault.jpg".to_string()),
            provider_name: Some("YouTube".to_string()),
        })
    }
}

/// Build an [`AppState`] over the in-memory store and stub fetcher.
pub fn test_state(store: Arc<MemoryKeyStore>, admin_token: Option<&str>) -> AppState {
    AppState {
        store,
        admin: Arc::new(AdminGuard::new(admin_token.map(str::to_string))),
        fetcher: Arc::new(StubFetcher),
    }
}

/// Generate a key and seed it as active, returning its id and composite.
pub async fn issue_key(store: &MemoryKeyStore, name: &str, rate_limit_per_hour: i32) -> (i64, String) {
    let generated = key_service::generate();
    let id = store
        .seed_key(
            &generated.key_id,
            &generated.key_hash,
            name,
            rate_limit_per_hour,
            true,
        )
        .await;
    (id, generated.api_key)
}

/// Full production router over the fake store, no admin secret configured.
pub fn public_router(store: Arc<MemoryKeyStore>) -> Router {
    crate::build_router(test_state(store, None))
}

/// Full production router over the fake store with the given admin secret.
pub fn admin_router(store: Arc<MemoryKeyStore>, admin_token: Option<&str>) -> Router {
    crate::build_router(test_state(store, admin_token))
}
