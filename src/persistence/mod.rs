//! Durable correlation store: TTL-bounded key-value records.
//!
//! The store persists the side of a transaction that arrives via
//! transport capture so a live, possibly-already-blocked request can
//! later discover it. It is an injected abstraction
//! ([`CorrelationStore`]) over whatever key-value service backs it; the
//! relay ships an in-memory backend and a PostgreSQL backend.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RelayError;

pub use memory::InMemoryCorrelationStore;
pub use postgres::PostgresCorrelationStore;

/// Normalized request half of a captured exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedRequest {
    /// HTTP method.
    pub method: String,
    /// Full request URL.
    pub url: String,
    /// Headers, last-write-wins per name.
    pub headers: HashMap<String, String>,
    /// Parsed request body.
    pub body: serde_json::Value,
}

/// Normalized response half of a captured exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Headers, last-write-wins per name.
    pub headers: HashMap<String, String>,
    /// Parsed response body.
    pub body: serde_json::Value,
}

/// Durable entry keyed by correlation ID.
///
/// At most one record per correlation ID; writes overwrite (last write
/// wins). After the TTL elapses the record must be treated as absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationRecord {
    /// The correlation ID this record is stored under.
    pub correlation_id: String,
    /// Captured request side.
    pub request: CapturedRequest,
    /// Captured response side.
    pub response: CapturedResponse,
    /// Storage timestamp.
    pub stored_at: DateTime<Utc>,
}

/// TTL-capable key-value store for [`CorrelationRecord`]s.
///
/// All failures surface as [`RelayError::StoreUnavailable`]; an expired
/// or missing key reads as `None`, never as an error.
#[async_trait]
pub trait CorrelationStore: Send + Sync + std::fmt::Debug {
    /// Stores a record under its correlation ID with the fixed TTL,
    /// overwriting any previous record.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::StoreUnavailable`] on backend failure.
    async fn put(&self, record: CorrelationRecord) -> Result<(), RelayError>;

    /// Returns the record for a correlation ID, or `None` if missing or
    /// expired.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::StoreUnavailable`] on backend failure.
    async fn get(&self, correlation_id: &str) -> Result<Option<CorrelationRecord>, RelayError>;

    /// Returns all live records, most recently stored first.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::StoreUnavailable`] on backend failure.
    async fn list_all(&self) -> Result<Vec<CorrelationRecord>, RelayError>;

    /// Removes one record. Returns `true` if a live record existed.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::StoreUnavailable`] on backend failure.
    async fn remove(&self, correlation_id: &str) -> Result<bool, RelayError>;

    /// Removes every record.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::StoreUnavailable`] on backend failure.
    async fn clear(&self) -> Result<(), RelayError>;
}
