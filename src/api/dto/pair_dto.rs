//! DTOs for pair listing and comparison.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::diff::DiffReport;
use crate::domain::Pair;
use crate::service::{ComparisonResult, MetadataComparison};

/// One pair in the `GET /pairs` listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct PairSummaryDto {
    /// Deterministic pair identifier.
    #[schema(value_type = String)]
    pub pair_id: String,
    /// Correlation ID both sides share.
    pub correlation_id: String,
    /// Side A source (always the orchestrator when present).
    pub side_a_source: String,
    /// Side B source.
    pub side_b_source: String,
    /// Classified kind of side A.
    pub kind: String,
    /// When the pair was formed.
    pub created_at: DateTime<Utc>,
    /// Whether the pair has been diffed.
    pub compared: bool,
}

impl From<&Pair> for PairSummaryDto {
    fn from(pair: &Pair) -> Self {
        Self {
            pair_id: pair.id.to_string(),
            correlation_id: pair.correlation_id.clone(),
            side_a_source: pair.side_a.source.to_string(),
            side_b_source: pair.side_b.source.to_string(),
            kind: pair.side_a.kind.to_string(),
            created_at: pair.created_at,
            compared: pair.compared,
        }
    }
}

/// Response body for `GET /pairs`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PairListResponse {
    /// Pairs in creation order.
    pub data: Vec<PairSummaryDto>,
    /// Total count.
    pub total: usize,
}

/// Metadata equality section of a comparison response.
#[derive(Debug, Serialize, ToSchema)]
pub struct MetadataComparisonDto {
    /// Both sides used the same HTTP method.
    pub method_matches: bool,
    /// Both sides called the same URL.
    pub url_matches: bool,
    /// Both sides classified to the same kind.
    pub kind_matches: bool,
}

/// Response body for `POST /pairs/{id}/compare`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ComparisonResponse {
    /// Pair identifier.
    #[schema(value_type = String)]
    pub pair_id: String,
    /// Correlation ID both sides share.
    pub correlation_id: String,
    /// Structural diff of the two sides' headers.
    pub headers: DiffReport,
    /// Structural diff of the two sides' bodies.
    pub body: DiffReport,
    /// Transport metadata equality.
    pub metadata: MetadataComparisonDto,
    /// Match percentage folded across headers and body.
    pub match_percentage: u8,
    /// `true` when both sides are equivalent.
    pub identical: bool,
}

impl From<ComparisonResult> for ComparisonResponse {
    fn from(result: ComparisonResult) -> Self {
        let MetadataComparison {
            method_matches,
            url_matches,
            kind_matches,
        } = result.metadata;
        Self {
            pair_id: result.pair.id.to_string(),
            correlation_id: result.pair.correlation_id,
            headers: result.headers,
            body: result.body,
            metadata: MetadataComparisonDto {
                method_matches,
                url_matches,
                kind_matches,
            },
            match_percentage: result.match_percentage,
            identical: result.identical,
        }
    }
}
