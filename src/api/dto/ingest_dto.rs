//! DTOs for the ingestion endpoint.

use serde::Serialize;
use utoipa::ToSchema;

use crate::service::IngestSummary;

/// Acknowledgement body for `POST /receive`.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestAckResponse {
    /// Always `"received"`.
    pub status: String,
    /// Ingestion identifier of the recorded message.
    #[schema(value_type = String)]
    pub message_id: String,
    /// Classified kind.
    pub kind: String,
    /// Detected source system.
    pub source: String,
    /// Correlation ID (or generated fallback) for log correlation.
    pub correlation_id: String,
    /// Whether this ingestion completed a pair.
    pub paired: bool,
    /// The completed pair's ID, when one was formed.
    #[schema(value_type = Option<String>)]
    pub pair_id: Option<String>,
}

impl From<IngestSummary> for IngestAckResponse {
    fn from(summary: IngestSummary) -> Self {
        Self {
            status: "received".to_string(),
            message_id: summary.message_id.to_string(),
            kind: summary.kind.to_string(),
            source: summary.source.to_string(),
            correlation_id: summary.display_id,
            paired: summary.paired,
            pair_id: summary.pair_id.map(|id| id.to_string()),
        }
    }
}
