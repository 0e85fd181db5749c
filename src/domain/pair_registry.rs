//! Ordered collection of completed pairs.
//!
//! [`PairRegistry`] keeps pairs in creation order, queryable by ID, with
//! an explicit bulk clear. Clearing ends a pairing epoch; the pairing
//! sequence counter survives so re-pairing the same correlation ID after
//! a clear still yields a fresh deterministic [`PairId`].

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use super::pair::{Pair, PairId};
use crate::error::RelayError;

/// Central store for completed pairs.
#[derive(Debug)]
pub struct PairRegistry {
    pairs: RwLock<Vec<Pair>>,
    sequence: AtomicU64,
}

impl PairRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pairs: RwLock::new(Vec::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Reserves the next pairing sequence number.
    ///
    /// Monotonic across clears, so every pairing event gets a distinct
    /// [`PairId`] even for a repeated correlation ID.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Appends a pair to the registry.
    pub async fn register(&self, pair: Pair) {
        tracing::info!(pair_id = %pair.id, correlation_id = %pair.correlation_id, "pair registered");
        self.pairs.write().await.push(pair);
    }

    /// Returns the pair with the given ID, if present.
    pub async fn find(&self, id: PairId) -> Option<Pair> {
        self.pairs.read().await.iter().find(|p| p.id == id).cloned()
    }

    /// Returns all pairs in creation order.
    pub async fn list_all(&self) -> Vec<Pair> {
        self.pairs.read().await.clone()
    }

    /// Sets the `compared` flag on a pair and returns the updated copy.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::PairNotFound`] if no pair with the given ID
    /// exists.
    pub async fn mark_compared(&self, id: PairId) -> Result<Pair, RelayError> {
        let mut pairs = self.pairs.write().await;
        let pair = pairs
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| RelayError::PairNotFound(id.to_string()))?;
        pair.compared = true;
        Ok(pair.clone())
    }

    /// Destroys every pair, ending the current pairing epoch.
    pub async fn clear(&self) {
        let mut pairs = self.pairs.write().await;
        tracing::info!(count = pairs.len(), "clearing pair registry");
        pairs.clear();
    }

    /// Returns the number of pairs.
    pub async fn len(&self) -> usize {
        self.pairs.read().await.len()
    }

    /// Returns `true` if the registry holds no pairs.
    pub async fn is_empty(&self) -> bool {
        self.pairs.read().await.is_empty()
    }

    /// Returns the number of pairs that have been diffed.
    pub async fn compared_count(&self) -> usize {
        self.pairs.read().await.iter().filter(|p| p.compared).count()
    }
}

impl Default for PairRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Message, MessageId, MessageKind, Source};
    use chrono::Utc;
    use std::collections::HashMap;

    fn make_message(source: Source) -> Message {
        Message {
            id: MessageId::new(),
            correlation_id: Some("r1".to_string()),
            timestamp: Utc::now(),
            method: "POST".to_string(),
            url: "/payments".to_string(),
            headers: HashMap::new(),
            body: serde_json::json!({}),
            kind: MessageKind::PaymentRequest,
            source,
            paired: false,
        }
    }

    fn make_pair(registry: &PairRegistry, correlation_id: &str) -> Pair {
        let pair = Pair::from_sides(
            correlation_id.to_string(),
            registry.next_sequence(),
            make_message(Source::Orchestrator),
            make_message(Source::Connector),
        );
        let Ok(pair) = pair else {
            panic!("pair construction failed");
        };
        pair
    }

    #[tokio::test]
    async fn register_and_find() {
        let registry = PairRegistry::new();
        let pair = make_pair(&registry, "r1");
        let id = pair.id;

        registry.register(pair).await;
        assert!(registry.find(id).await.is_some());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn find_missing_returns_none() {
        let registry = PairRegistry::new();
        assert!(registry.find(PairId::derive("nope", 0)).await.is_none());
    }

    #[tokio::test]
    async fn list_preserves_creation_order() {
        let registry = PairRegistry::new();
        let first = make_pair(&registry, "r1");
        let second = make_pair(&registry, "r2");
        let (first_id, second_id) = (first.id, second.id);

        registry.register(first).await;
        registry.register(second).await;

        let ids: Vec<PairId> = registry.list_all().await.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![first_id, second_id]);
    }

    #[tokio::test]
    async fn mark_compared_sets_flag() {
        let registry = PairRegistry::new();
        let pair = make_pair(&registry, "r1");
        let id = pair.id;
        registry.register(pair).await;

        assert_eq!(registry.compared_count().await, 0);
        let updated = registry.mark_compared(id).await;
        let Ok(updated) = updated else {
            panic!("mark_compared failed");
        };
        assert!(updated.compared);
        assert_eq!(registry.compared_count().await, 1);
    }

    #[tokio::test]
    async fn mark_compared_missing_is_not_found() {
        let registry = PairRegistry::new();
        let result = registry.mark_compared(PairId::derive("nope", 0)).await;
        assert!(matches!(result, Err(RelayError::PairNotFound(_))));
    }

    #[tokio::test]
    async fn sequence_survives_clear() {
        let registry = PairRegistry::new();
        let before = make_pair(&registry, "r1");
        let before_id = before.id;
        registry.register(before).await;

        registry.clear().await;
        assert!(registry.is_empty().await);

        // Same correlation ID in a new epoch gets a different pair ID.
        let after = make_pair(&registry, "r1");
        assert_ne!(after.id, before_id);
    }
}
