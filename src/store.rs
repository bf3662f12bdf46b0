//! Credential and usage persistence.
//!
//! `KeyStore` is the abstract capability the rest of the subsystem works
//! against: lookup, insert, update, delete for credentials, plus the two
//! usage operations the rate limiter and usage logger need. Production wires
//! in [`PgKeyStore`]; tests substitute an in-memory fake.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    db::DbPool,
    models::{api_key::ApiKey, usage::NewUsage},
};

/// Persistence operations for credentials and usage records.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Look up a credential by its public `key_id`, active records only.
    ///
    /// Unknown and inactive ids are both `Ok(None)`; the caller must not
    /// be able to tell them apart.
    async fn find_active_by_key_id(&self, key_id: &str) -> Result<Option<ApiKey>, sqlx::Error>;

    /// Persist a new credential. Only `key_id` and `key_hash` are durable;
    /// the plaintext secret never reaches the store.
    async fn insert_credential(
        &self,
        key_id: &str,
        key_hash: &str,
        name: &str,
        rate_limit_per_hour: i32,
    ) -> Result<ApiKey, sqlx::Error>;

    /// Update `is_active` and/or `rate_limit_per_hour`; `None` fields are
    /// left unchanged. Returns the updated record, or `None` if the id is
    /// unknown.
    async fn update_credential(
        &self,
        id: i64,
        is_active: Option<bool>,
        rate_limit_per_hour: Option<i32>,
    ) -> Result<Option<ApiKey>, sqlx::Error>;

    /// Delete a credential and (by cascade) its entire usage history.
    /// Returns whether a record existed.
    async fn delete_credential(&self, id: i64) -> Result<bool, sqlx::Error>;

    /// All credentials, newest first, each with its count of usage rows
    /// recorded since `usage_since`.
    async fn list_with_usage(
        &self,
        usage_since: DateTime<Utc>,
    ) -> Result<Vec<(ApiKey, i64)>, sqlx::Error>;

    /// Number of usage rows for one credential since `since`. Feeds the
    /// rolling rate-limit window.
    async fn count_usage_since(
        &self,
        api_key_id: i64,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error>;

    /// Append one usage row. The store assigns the timestamp.
    async fn insert_usage(&self, usage: NewUsage) -> Result<(), sqlx::Error>;

    /// Cheap connectivity check backing the health endpoint.
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

/// PostgreSQL-backed [`KeyStore`].
#[derive(Clone)]
pub struct PgKeyStore {
    pool: DbPool,
}

impl PgKeyStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Row shape for the list query: a key plus its windowed usage count.
#[derive(sqlx::FromRow)]
struct KeyWithUsageRow {
    #[sqlx(flatten)]
    key: ApiKey,
    usage_count: i64,
}

#[async_trait]
impl KeyStore for PgKeyStore {
    async fn find_active_by_key_id(&self, key_id: &str) -> Result<Option<ApiKey>, sqlx::Error> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT id, key_id, key_hash, name, is_active, rate_limit_per_hour,
                   created_at, updated_at
            FROM api_keys
            WHERE key_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(key_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn insert_credential(
        &self,
        key_id: &str,
        key_hash: &str,
        name: &str,
        rate_limit_per_hour: i32,
    ) -> Result<ApiKey, sqlx::Error> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            INSERT INTO api_keys (key_id, key_hash, name, rate_limit_per_hour)
            VALUES ($1, $2, $3, $4)
            RETURNING id, key_id, key_hash, name, is_active, rate_limit_per_hour,
                      created_at, updated_at
            "#,
        )
        .bind(key_id)
        .bind(key_hash)
        .bind(name)
        .bind(rate_limit_per_hour)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_credential(
        &self,
        id: i64,
        is_active: Option<bool>,
        rate_limit_per_hour: Option<i32>,
    ) -> Result<Option<ApiKey>, sqlx::Error> {
        sqlx::query_as::<_, ApiKey>(
            r#"
            UPDATE api_keys
            SET is_active = COALESCE($2, is_active),
                rate_limit_per_hour = COALESCE($3, rate_limit_per_hour),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, key_id, key_hash, name, is_active, rate_limit_per_hour,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(is_active)
        .bind(rate_limit_per_hour)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_credential(&self, id: i64) -> Result<bool, sqlx::Error> {
        // ON DELETE CASCADE on api_usage removes the usage history with it
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_with_usage(
        &self,
        usage_since: DateTime<Utc>,
    ) -> Result<Vec<(ApiKey, i64)>, sqlx::Error> {
        let rows = sqlx::query_as::<_, KeyWithUsageRow>(
            r#"
            SELECT k.id, k.key_id, k.key_hash, k.name, k.is_active,
                   k.rate_limit_per_hour, k.created_at, k.updated_at,
                   COUNT(u.id) FILTER (WHERE u.request_timestamp >= $1) AS usage_count
            FROM api_keys k
            LEFT JOIN api_usage u ON u.api_key_id = k.id
            GROUP BY k.id
            ORDER BY k.created_at DESC
            "#,
        )
        .bind(usage_since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| (r.key, r.usage_count)).collect())
    }

    async fn count_usage_since(
        &self,
        api_key_id: i64,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM api_usage
            WHERE api_key_id = $1 AND request_timestamp >= $2
            "#,
        )
        .bind(api_key_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
    }

    async fn insert_usage(&self, usage: NewUsage) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO api_usage
                (api_key_id, endpoint, response_status, processing_time_ms, error_message)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(usage.api_key_id)
        .bind(&usage.endpoint)
        .bind(usage.response_status)
        .bind(usage.processing_time_ms)
        .bind(&usage.error_message)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
