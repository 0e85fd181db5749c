//! PostgreSQL implementation of the correlation store.
//!
//! One row per correlation ID, keyed with the configured namespace
//! prefix. TTL is enforced at read time (`expires_at > now()`); expired
//! rows are deleted opportunistically on write.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{CorrelationRecord, CorrelationStore};
use crate::error::RelayError;

/// PostgreSQL-backed correlation store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresCorrelationStore {
    pool: PgPool,
    key_prefix: String,
    ttl: Duration,
}

impl PostgresCorrelationStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool, key_prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
            ttl,
        }
    }

    /// Creates the backing table if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::StoreUnavailable`] on database failure.
    pub async fn ensure_schema(&self) -> Result<(), RelayError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS correlation_records ( \
                 key TEXT PRIMARY KEY, \
                 record JSONB NOT NULL, \
                 stored_at TIMESTAMPTZ NOT NULL, \
                 expires_at TIMESTAMPTZ NOT NULL \
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| RelayError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }

    fn key(&self, correlation_id: &str) -> String {
        format!("{}{correlation_id}", self.key_prefix)
    }

    fn deadline(&self) -> DateTime<Utc> {
        Utc::now() + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero())
    }
}

#[async_trait]
impl CorrelationStore for PostgresCorrelationStore {
    async fn put(&self, record: CorrelationRecord) -> Result<(), RelayError> {
        let payload = serde_json::to_value(&record)
            .map_err(|e| RelayError::Internal(format!("record serialization: {e}")))?;

        sqlx::query("DELETE FROM correlation_records WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(|e| RelayError::StoreUnavailable(e.to_string()))?;

        sqlx::query(
            "INSERT INTO correlation_records (key, record, stored_at, expires_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (key) DO UPDATE \
             SET record = $2, stored_at = $3, expires_at = $4",
        )
        .bind(self.key(&record.correlation_id))
        .bind(&payload)
        .bind(record.stored_at)
        .bind(self.deadline())
        .execute(&self.pool)
        .await
        .map_err(|e| RelayError::StoreUnavailable(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, correlation_id: &str) -> Result<Option<CorrelationRecord>, RelayError> {
        let row = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT record FROM correlation_records \
             WHERE key = $1 AND expires_at > now()",
        )
        .bind(self.key(correlation_id))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RelayError::StoreUnavailable(e.to_string()))?;

        row.map(|value| {
            serde_json::from_value(value)
                .map_err(|e| RelayError::Internal(format!("record deserialization: {e}")))
        })
        .transpose()
    }

    async fn list_all(&self) -> Result<Vec<CorrelationRecord>, RelayError> {
        let rows = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT record FROM correlation_records \
             WHERE expires_at > now() ORDER BY stored_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RelayError::StoreUnavailable(e.to_string()))?;

        rows.into_iter()
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| RelayError::Internal(format!("record deserialization: {e}")))
            })
            .collect()
    }

    async fn remove(&self, correlation_id: &str) -> Result<bool, RelayError> {
        let result = sqlx::query(
            "DELETE FROM correlation_records WHERE key = $1 AND expires_at > now()",
        )
        .bind(self.key(correlation_id))
        .execute(&self.pool)
        .await
        .map_err(|e| RelayError::StoreUnavailable(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> Result<(), RelayError> {
        sqlx::query("DELETE FROM correlation_records")
            .execute(&self.pool)
            .await
            .map_err(|e| RelayError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }
}
