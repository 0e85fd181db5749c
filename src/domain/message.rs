//! Observed HTTP exchange sides and their identity.
//!
//! A [`Message`] is one observed side of an HTTP exchange from either
//! system under test. Its payload content is immutable once recorded;
//! only the `paired` flag mutates, exactly once per pairing epoch.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an ingested message.
///
/// Wraps a UUID v4, generated at ingestion time. Distinct from the
/// correlation ID: two messages share a correlation ID, never a
/// `MessageId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(uuid::Uuid);

impl MessageId {
    /// Creates a new random `MessageId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `MessageId` from an existing [`uuid::Uuid`].
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

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the two systems under comparison produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Side A: the legacy payment orchestrator.
    #[serde(rename = "legacy-orchestrator")]
    Orchestrator,
    /// Side B: the new unified connector service.
    #[serde(rename = "connector-service")]
    Connector,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Orchestrator => write!(f, "legacy-orchestrator"),
            Self::Connector => write!(f, "connector-service"),
        }
    }
}

/// One observed HTTP exchange side.
///
/// Header names are lowercased by the HTTP layer on ingestion, so all
/// header lookups across the relay are case-insensitive by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique ingestion identifier.
    pub id: MessageId,
    /// Correlation key tying this message to its counterpart. `None` when
    /// no explicit ID could be extracted; such messages can never pair.
    pub correlation_id: Option<String>,
    /// Ingestion timestamp.
    pub timestamp: DateTime<Utc>,
    /// HTTP method as received.
    pub method: String,
    /// Request URL or path as received.
    pub url: String,
    /// Headers, last-write-wins per name.
    pub headers: HashMap<String, String>,
    /// Parsed JSON body, or a JSON string wrapping raw text.
    pub body: serde_json::Value,
    /// Classified message kind.
    pub kind: super::MessageKind,
    /// Which system produced this message.
    pub source: Source,
    /// Whether this message has been consumed into a pair. Flips exactly
    /// once per pairing epoch; reset by a clear-pairs epoch rollover.
    pub paired: bool,
}

impl Message {
    /// Returns the value of a header, looked up case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        let lower = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| k.to_ascii_lowercase() == lower)
            .map(|(_, v)| v.as_str())
    }
}
