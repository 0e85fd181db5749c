//! Administrative handlers: message log, counters, and full reset.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::dto::{
    ClearedResponse, MessageListResponse, MessageSummaryDto, StatsResponse,
};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// `GET /messages` — List all ingested messages.
#[utoipa::path(
    get,
    path = "/api/v1/messages",
    tag = "Admin",
    summary = "List ingested messages",
    description = "Returns the raw message log in arrival order, including unpaired and unclassifiable messages.",
    responses(
        (status = 200, description = "Message list", body = MessageListResponse),
    )
)]
pub async fn list_messages(State(state): State<AppState>) -> impl IntoResponse {
    let messages = state.relay_service.list_messages().await;
    let data: Vec<MessageSummaryDto> = messages.iter().map(MessageSummaryDto::from).collect();
    let total = data.len();
    Json(MessageListResponse { data, total })
}

/// `GET /stats` — Bulk relay counters.
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "Admin",
    summary = "Relay statistics",
    description = "Returns message, pending, pair, and comparison counters.",
    responses(
        (status = 200, description = "Current counters", body = StatsResponse),
    )
)]
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.relay_service.stats().await;
    Json(StatsResponse {
        messages: stats.messages,
        unpaired: stats.unpaired,
        pending: stats.pending,
        pairs: stats.pairs,
        compared: stats.compared,
    })
}

/// `DELETE /state` — Clear all relay state.
///
/// # Errors
///
/// Returns [`RelayError::StoreUnavailable`] if the store clear fails.
#[utoipa::path(
    delete,
    path = "/api/v1/state",
    tag = "Admin",
    summary = "Clear all state",
    description = "Clears messages, pending entries, pairs, and stored correlation records.",
    responses(
        (status = 200, description = "State cleared", body = ClearedResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn clear_state(State(state): State<AppState>) -> Result<impl IntoResponse, RelayError> {
    state.relay_service.clear_all().await?;
    Ok(Json(ClearedResponse {
        cleared: "state".to_string(),
        message: "messages, pending entries, pairs, and records cleared".to_string(),
    }))
}

/// Admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages))
        .route("/stats", get(stats))
        .route("/state", delete(clear_state))
}
