//! DTOs shared across resources.

use serde::Serialize;
use utoipa::ToSchema;

/// Generic acknowledgement for destructive operations.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClearedResponse {
    /// What was cleared.
    pub cleared: String,
    /// Human-readable confirmation.
    pub message: String,
}

/// Bulk counters for `GET /stats`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Total ingested messages.
    pub messages: usize,
    /// Messages not consumed into a pair this epoch.
    pub unpaired: usize,
    /// Live pending entries awaiting a counterpart.
    pub pending: usize,
    /// Completed pairs.
    pub pairs: usize,
    /// Pairs that have been diffed.
    pub compared: usize,
}
