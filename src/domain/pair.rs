//! Completed pairs of correlated messages.
//!
//! A [`Pair`] is the unit of comparison: the two sides of one logical
//! transaction, one from each system under test. Created the instant both
//! sides are known; never mutated except the `compared` flag; destroyed
//! only by an explicit bulk clear.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::{Message, Source};

/// Deterministic pair identifier.
///
/// UUID v5 over `"{correlation_id}:{sequence}"`, so the same correlation
/// ID re-paired in a later epoch yields a distinct but reproducible ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(uuid::Uuid);

impl PairId {
    /// Derives a pair ID from the correlation ID and pairing sequence
    /// number.
    #[must_use]
    pub fn derive(correlation_id: &str, sequence: u64) -> Self {
        let name = format!("{correlation_id}:{sequence}");
        Self(uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, name.as_bytes()))
    }

    /// Creates a `PairId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cross-cutting tags extracted from the paired messages' headers,
/// preferring side A's value then side B's.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairMetadata {
    /// Logical payment flow label (`x-flow` header).
    pub flow: Option<String>,
    /// Gateway connector label (`x-connector` header).
    pub connector: Option<String>,
}

impl PairMetadata {
    /// Resolves metadata from the two sides' headers.
    #[must_use]
    pub fn resolve(side_a: &Message, side_b: &Message) -> Self {
        let pick = |name: &str| {
            side_a
                .header(name)
                .or_else(|| side_b.header(name))
                .map(str::to_string)
        };
        Self {
            flow: pick("x-flow"),
            connector: pick("x-connector"),
        }
    }
}

/// Two correlated messages plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pair {
    /// Deterministic pair identifier.
    pub id: PairId,
    /// The shared correlation ID that formed this pair.
    pub correlation_id: String,
    /// Side A: message from the legacy orchestrator.
    pub side_a: Message,
    /// Side B: message from the new connector service.
    pub side_b: Message,
    /// Extracted cross-cutting tags.
    pub metadata: PairMetadata,
    /// Whether this pair has been diffed.
    pub compared: bool,
    /// Pair creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Pair {
    /// Builds a pair from two messages of a shared correlation ID.
    ///
    /// Sides are assigned by source label regardless of arrival order, so
    /// `side_a` is always the orchestrator message. Both messages are
    /// marked `paired`.
    ///
    /// # Errors
    ///
    /// Returns an error string if the messages come from the same source;
    /// the pending table never offers such a combination.
    pub fn from_sides(
        correlation_id: String,
        sequence: u64,
        first: Message,
        second: Message,
    ) -> Result<Self, String> {
        let (mut side_a, mut side_b) = match (first.source, second.source) {
            (Source::Orchestrator, Source::Connector) => (first, second),
            (Source::Connector, Source::Orchestrator) => (second, first),
            (same, _) => return Err(format!("both sides from {same}")),
        };
        side_a.paired = true;
        side_b.paired = true;

        let metadata = PairMetadata::resolve(&side_a, &side_b);
        Ok(Self {
            id: PairId::derive(&correlation_id, sequence),
            correlation_id,
            side_a,
            side_b,
            metadata,
            compared: false,
            created_at: Utc::now(),
        })
    }
}
