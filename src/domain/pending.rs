//! Pending-request table: messages waiting for their counterpart.
//!
//! [`PendingRequestTable`] holds at most one entry per correlation ID.
//! The check-and-insert in [`PendingRequestTable::offer`] runs inside a
//! single write-lock scope, so pairing is atomic relative to other
//! inbound messages. This is the ONLY pairing mechanism: there is no
//! fallback by timestamp proximity or content similarity.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::message::Message;

/// A message from one source waiting for its counterpart.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    /// The waiting message.
    pub message: Message,
    /// When the entry was inserted; used for TTL pruning.
    pub inserted_at: DateTime<Utc>,
}

/// Result of offering a message for pairing.
#[derive(Debug)]
pub enum Offer {
    /// A counterpart was waiting: both sides, in arrival order. The
    /// caller assembles the [`super::Pair`] and registers it.
    Matched {
        /// The previously pending counterpart.
        counterpart: Message,
        /// The message just offered.
        offered: Message,
    },
    /// No counterpart yet; the message is now pending.
    Pending,
    /// The message carries no correlation ID and can never pair.
    /// A no-op, not an error.
    Unpairable,
}

/// In-memory table of correlation-id → waiting message.
///
/// Entries expire after a configurable TTL to avoid unbounded growth;
/// expired entries are pruned lazily on access.
#[derive(Debug)]
pub struct PendingRequestTable {
    entries: RwLock<HashMap<String, PendingEntry>>,
    ttl: Duration,
}

impl PendingRequestTable {
    /// Creates an empty table with the given entry TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Offers a message for pairing.
    ///
    /// If a counterpart from the other source is pending under the same
    /// correlation ID, both messages are returned and the entry is
    /// removed. A second arrival from the *same* source overwrites the
    /// existing entry (explicit last-wins; the displaced message is lost
    /// to pairing and a warning is logged).
    pub async fn offer(&self, message: Message) -> Offer {
        let Some(correlation_id) = message.correlation_id.clone() else {
            tracing::info!(message_id = %message.id, "message has no correlation id; left unpaired");
            return Offer::Unpairable;
        };

        let mut entries = self.entries.write().await;
        Self::prune_locked(&mut entries, self.ttl);

        match entries.remove(&correlation_id) {
            Some(entry) if entry.message.source != message.source => {
                tracing::info!(
                    %correlation_id,
                    pending_id = %entry.message.id,
                    offered_id = %message.id,
                    "counterpart found; forming pair"
                );
                Offer::Matched {
                    counterpart: entry.message,
                    offered: message,
                }
            }
            existing => {
                if let Some(displaced) = existing {
                    tracing::warn!(
                        %correlation_id,
                        displaced_id = %displaced.message.id,
                        offered_id = %message.id,
                        "same-source retry before pairing; last pending wins"
                    );
                }
                entries.insert(
                    correlation_id,
                    PendingEntry {
                        message,
                        inserted_at: Utc::now(),
                    },
                );
                Offer::Pending
            }
        }
    }

    /// Returns the number of live pending entries.
    pub async fn len(&self) -> usize {
        let mut entries = self.entries.write().await;
        Self::prune_locked(&mut entries, self.ttl);
        entries.len()
    }

    /// Returns `true` if no entries are pending.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Removes every pending entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    fn prune_locked(entries: &mut HashMap<String, PendingEntry>, ttl: Duration) {
        let now = Utc::now();
        entries.retain(|correlation_id, entry| {
            let age = now.signed_duration_since(entry.inserted_at);
            let live = age.to_std().map(|a| a < ttl).unwrap_or(true);
            if !live {
                tracing::debug!(%correlation_id, "pending entry expired");
            }
            live
        });
    }
}
