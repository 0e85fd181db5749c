//! Bounded polling for a counterpart's stored response.
//!
//! [`ResponseWaiter::wait`] suspends a caller until the correlation
//! store holds a record for its ID or the attempt budget runs out. The
//! suspension is cooperative (`tokio::time::sleep` between ticks), so
//! any number of waits for different IDs run concurrently without
//! blocking each other. A timed-out wait leaves the store record
//! untouched: a late-arriving capture can still complete and remain
//! available for manual inspection.

use std::sync::Arc;
use std::time::Duration;

use crate::persistence::{CorrelationRecord, CorrelationStore};

/// Terminal outcome of one wait. Exactly one is produced per call.
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    /// The counterpart's response was found and its own correlation
    /// header matches the requested ID.
    Delivered {
        /// Stored response status code.
        status_code: u16,
        /// Stored response headers.
        headers: std::collections::HashMap<String, String>,
        /// Stored response body.
        body: serde_json::Value,
    },
    /// A record was found but its response's correlation header
    /// disagrees with the requested ID. Never silently delivered.
    Mismatch,
    /// The attempt budget elapsed without a hit.
    Timeout,
    /// The store failed during a tick; the wait aborts rather than
    /// retrying indefinitely.
    StoreError(String),
}

/// Bounded poller over the correlation store.
#[derive(Debug, Clone)]
pub struct ResponseWaiter {
    store: Arc<dyn CorrelationStore>,
    poll_interval: Duration,
    max_attempts: u32,
    correlation_header: String,
}

impl ResponseWaiter {
    /// Creates a waiter with the given polling protocol parameters.
    #[must_use]
    pub fn new(
        store: Arc<dyn CorrelationStore>,
        poll_interval: Duration,
        max_attempts: u32,
        correlation_header: impl Into<String>,
    ) -> Self {
        Self {
            store,
            poll_interval,
            max_attempts,
            correlation_header: correlation_header.into().to_ascii_lowercase(),
        }
    }

    /// Waits for the counterpart of `correlation_id`.
    ///
    /// One immediate lookup, then up to `max_attempts` polls at the
    /// configured interval. Returns exactly one terminal [`WaitOutcome`].
    pub async fn wait(&self, correlation_id: &str) -> WaitOutcome {
        match self.check(correlation_id).await {
            Some(outcome) => outcome,
            None => self.poll(correlation_id).await,
        }
    }

    async fn poll(&self, correlation_id: &str) -> WaitOutcome {
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.poll_interval).await;
            tracing::debug!(%correlation_id, attempt, "polling correlation store");
            if let Some(outcome) = self.check(correlation_id).await {
                return outcome;
            }
        }
        tracing::info!(
            %correlation_id,
            attempts = self.max_attempts,
            "no counterpart within attempt budget"
        );
        WaitOutcome::Timeout
    }

    /// One lookup-and-validate step. `None` means "not there yet".
    async fn check(&self, correlation_id: &str) -> Option<WaitOutcome> {
        match self.store.get(correlation_id).await {
            Ok(Some(record)) => Some(self.validate(correlation_id, record)),
            Ok(None) => None,
            Err(err) => {
                tracing::error!(%correlation_id, error = %err, "store access failed during wait");
                Some(WaitOutcome::StoreError(err.to_string()))
            }
        }
    }

    fn validate(&self, correlation_id: &str, record: CorrelationRecord) -> WaitOutcome {
        let stored_id = record
            .response
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(&self.correlation_header))
            .map(|(_, v)| v.as_str());

        match stored_id {
            Some(id) if id == correlation_id => WaitOutcome::Delivered {
                status_code: record.response.status_code,
                headers: record.response.headers,
                body: record.response.body,
            },
            other => {
                tracing::warn!(
                    %correlation_id,
                    stored_id = other.unwrap_or("<missing>"),
                    "stored response correlation header disagrees"
                );
                WaitOutcome::Mismatch
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use crate::persistence::{
        CapturedRequest, CapturedResponse, CorrelationRecord, InMemoryCorrelationStore,
    };
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    const FAST: Duration = Duration::from_millis(5);

    fn make_record(correlation_id: &str, response_header_id: &str) -> CorrelationRecord {
        CorrelationRecord {
            correlation_id: correlation_id.to_string(),
            request: CapturedRequest {
                method: "POST".to_string(),
                url: "https://gateway.example/xml/v1".to_string(),
                headers: HashMap::new(),
                body: serde_json::json!({}),
            },
            response: CapturedResponse {
                status_code: 200,
                headers: HashMap::from([(
                    "X-Request-Id".to_string(),
                    response_header_id.to_string(),
                )]),
                body: serde_json::json!({"transactionResponse": {"responseCode": "1"}}),
            },
            stored_at: Utc::now(),
        }
    }

    fn memory_store() -> Arc<InMemoryCorrelationStore> {
        Arc::new(InMemoryCorrelationStore::new(Duration::from_secs(3600)))
    }

    /// Store that counts lookups and always reads empty.
    #[derive(Debug, Default)]
    struct CountingStore {
        gets: AtomicU32,
    }

    #[async_trait]
    impl CorrelationStore for CountingStore {
        async fn put(&self, _record: CorrelationRecord) -> Result<(), RelayError> {
            Ok(())
        }
        async fn get(&self, _id: &str) -> Result<Option<CorrelationRecord>, RelayError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
        async fn list_all(&self) -> Result<Vec<CorrelationRecord>, RelayError> {
            Ok(Vec::new())
        }
        async fn remove(&self, _id: &str) -> Result<bool, RelayError> {
            Ok(false)
        }
        async fn clear(&self) -> Result<(), RelayError> {
            Ok(())
        }
    }

    /// Store that always fails reads.
    #[derive(Debug, Default)]
    struct FailingStore;

    #[async_trait]
    impl CorrelationStore for FailingStore {
        async fn put(&self, _record: CorrelationRecord) -> Result<(), RelayError> {
            Err(RelayError::StoreUnavailable("down".to_string()))
        }
        async fn get(&self, _id: &str) -> Result<Option<CorrelationRecord>, RelayError> {
            Err(RelayError::StoreUnavailable("down".to_string()))
        }
        async fn list_all(&self) -> Result<Vec<CorrelationRecord>, RelayError> {
            Err(RelayError::StoreUnavailable("down".to_string()))
        }
        async fn remove(&self, _id: &str) -> Result<bool, RelayError> {
            Err(RelayError::StoreUnavailable("down".to_string()))
        }
        async fn clear(&self) -> Result<(), RelayError> {
            Err(RelayError::StoreUnavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn already_stored_record_delivers_immediately() {
        let store = memory_store();
        let _ = store.put(make_record("r1", "r1")).await;
        let waiter = ResponseWaiter::new(store, FAST, 5, "x-request-id");

        let outcome = waiter.wait("r1").await;
        let WaitOutcome::Delivered { status_code, headers, body } = outcome else {
            panic!("expected delivery");
        };
        assert_eq!(status_code, 200);
        assert_eq!(headers.get("X-Request-Id").map(String::as_str), Some("r1"));
        assert_eq!(
            body.pointer("/transactionResponse/responseCode").and_then(|v| v.as_str()),
            Some("1")
        );
    }

    #[tokio::test]
    async fn write_during_poll_resolves_delivery() {
        let store = memory_store();
        let waiter =
            ResponseWaiter::new(Arc::clone(&store) as Arc<dyn CorrelationStore>, FAST, 5, "x-request-id");

        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                tokio::time::sleep(FAST * 2).await;
                let _ = store.put(make_record("r1", "r1")).await;
            })
        };

        let outcome = waiter.wait("r1").await;
        let _ = writer.await;
        assert!(matches!(outcome, WaitOutcome::Delivered { .. }));
    }

    #[tokio::test]
    async fn mismatched_inner_id_is_never_delivered() {
        let store = memory_store();
        let _ = store.put(make_record("r1", "other")).await;
        let waiter = ResponseWaiter::new(store, FAST, 5, "x-request-id");

        assert!(matches!(waiter.wait("r1").await, WaitOutcome::Mismatch));
    }

    #[tokio::test]
    async fn missing_inner_header_is_mismatch() {
        let store = memory_store();
        let mut record = make_record("r1", "r1");
        record.response.headers.clear();
        let _ = store.put(record).await;
        let waiter = ResponseWaiter::new(store, FAST, 5, "x-request-id");

        assert!(matches!(waiter.wait("r1").await, WaitOutcome::Mismatch));
    }

    #[tokio::test]
    async fn timeout_after_exact_attempt_budget() {
        let store = Arc::new(CountingStore::default());
        let waiter = ResponseWaiter::new(
            Arc::clone(&store) as Arc<dyn CorrelationStore>,
            FAST,
            5,
            "x-request-id",
        );

        let outcome = waiter.wait("r1").await;
        assert!(matches!(outcome, WaitOutcome::Timeout));
        // One immediate lookup plus five polls.
        assert_eq!(store.gets.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn store_failure_aborts_the_wait() {
        let waiter = ResponseWaiter::new(Arc::new(FailingStore), FAST, 5, "x-request-id");
        assert!(matches!(waiter.wait("r1").await, WaitOutcome::StoreError(_)));
    }

    #[tokio::test]
    async fn concurrent_waits_do_not_interfere() {
        let store = memory_store();
        let _ = store.put(make_record("r2", "r2")).await;
        let waiter =
            ResponseWaiter::new(Arc::clone(&store) as Arc<dyn CorrelationStore>, FAST, 2, "x-request-id");

        let slow = {
            let waiter = waiter.clone();
            tokio::spawn(async move { waiter.wait("never").await })
        };
        let fast = waiter.wait("r2").await;
        assert!(matches!(fast, WaitOutcome::Delivered { .. }));

        let slow = slow.await;
        let Ok(slow) = slow else {
            panic!("join failed");
        };
        assert!(matches!(slow, WaitOutcome::Timeout));
    }
}
