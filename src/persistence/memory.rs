//! In-memory correlation store with lazy TTL expiry.
//!
//! Default backend when persistence is disabled and the backend used in
//! unit tests. Expiry is checked on every read; there is no background
//! sweeper.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{CorrelationRecord, CorrelationStore};
use crate::error::RelayError;

#[derive(Debug, Clone)]
struct StoredEntry {
    record: CorrelationRecord,
    expires_at: DateTime<Utc>,
}

/// RwLock'd map of correlation-id → (record, deadline).
#[derive(Debug)]
pub struct InMemoryCorrelationStore {
    entries: RwLock<HashMap<String, StoredEntry>>,
    ttl: Duration,
}

impl InMemoryCorrelationStore {
    /// Creates an empty store with the given record TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    fn deadline(&self) -> DateTime<Utc> {
        Utc::now() + chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero())
    }
}

#[async_trait]
impl CorrelationStore for InMemoryCorrelationStore {
    async fn put(&self, record: CorrelationRecord) -> Result<(), RelayError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            record.correlation_id.clone(),
            StoredEntry {
                record,
                expires_at: self.deadline(),
            },
        );
        Ok(())
    }

    async fn get(&self, correlation_id: &str) -> Result<Option<CorrelationRecord>, RelayError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(correlation_id)
            .filter(|entry| entry.expires_at > Utc::now())
            .map(|entry| entry.record.clone()))
    }

    async fn list_all(&self) -> Result<Vec<CorrelationRecord>, RelayError> {
        let now = Utc::now();
        let entries = self.entries.read().await;
        let mut records: Vec<CorrelationRecord> = entries
            .values()
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.record.clone())
            .collect();
        records.sort_by(|a, b| b.stored_at.cmp(&a.stored_at));
        Ok(records)
    }

    async fn remove(&self, correlation_id: &str) -> Result<bool, RelayError> {
        let mut entries = self.entries.write().await;
        let removed = entries
            .remove(correlation_id)
            .map(|entry| entry.expires_at > Utc::now())
            .unwrap_or(false);
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), RelayError> {
        self.entries.write().await.clear();
        Ok(())
    }
}
