//! DTOs for stored correlation records and the raw message log.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::Message;
use crate::persistence::CorrelationRecord;

/// One stored record in the `GET /records` listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordSummaryDto {
    /// Correlation ID the record is keyed by.
    pub correlation_id: String,
    /// Captured request method.
    pub method: String,
    /// Captured request URL.
    pub url: String,
    /// Captured response status code.
    pub status_code: u16,
    /// When the record was stored.
    pub stored_at: DateTime<Utc>,
}

impl From<&CorrelationRecord> for RecordSummaryDto {
    fn from(record: &CorrelationRecord) -> Self {
        Self {
            correlation_id: record.correlation_id.clone(),
            method: record.request.method.clone(),
            url: record.request.url.clone(),
            status_code: record.response.status_code,
            stored_at: record.stored_at,
        }
    }
}

/// Response body for `GET /records`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordListResponse {
    /// Live records, most recent first.
    pub data: Vec<RecordSummaryDto>,
    /// Total count.
    pub total: usize,
}

/// One entry in the `GET /messages` listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageSummaryDto {
    /// Ingestion identifier.
    #[schema(value_type = String)]
    pub message_id: String,
    /// Correlation ID, when one was extracted.
    pub correlation_id: Option<String>,
    /// Classified kind.
    pub kind: String,
    /// Source system.
    pub source: String,
    /// HTTP method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Whether the message was consumed into a pair this epoch.
    pub paired: bool,
    /// Arrival timestamp.
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for MessageSummaryDto {
    fn from(message: &Message) -> Self {
        Self {
            message_id: message.id.to_string(),
            correlation_id: message.correlation_id.clone(),
            kind: message.kind.to_string(),
            source: message.source.to_string(),
            method: message.method.clone(),
            url: message.url.clone(),
            paired: message.paired,
            timestamp: message.timestamp,
        }
    }
}

/// Response body for `GET /messages`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageListResponse {
    /// Messages in arrival order.
    pub data: Vec<MessageSummaryDto>,
    /// Total count.
    pub total: usize,
}
