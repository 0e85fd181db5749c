//! Pair handlers: list, get, compare, clear.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::api::dto::{ClearedResponse, ComparisonResponse, PairListResponse, PairSummaryDto};
use crate::app_state::AppState;
use crate::domain::PairId;
use crate::error::{ErrorResponse, RelayError};

/// `GET /pairs` — List all pairs in creation order.
#[utoipa::path(
    get,
    path = "/api/v1/pairs",
    tag = "Pairs",
    summary = "List pairs",
    description = "Returns every completed pair of the current epoch, oldest first.",
    responses(
        (status = 200, description = "Pair list", body = PairListResponse),
    )
)]
pub async fn list_pairs(State(state): State<AppState>) -> impl IntoResponse {
    let pairs = state.relay_service.list_pairs().await;
    let data: Vec<PairSummaryDto> = pairs.iter().map(PairSummaryDto::from).collect();
    let total = data.len();
    Json(PairListResponse { data, total })
}

/// `GET /pairs/:id` — Get one pair with both full messages.
///
/// # Errors
///
/// Returns [`RelayError::PairNotFound`] if the ID is unknown.
#[utoipa::path(
    get,
    path = "/api/v1/pairs/{id}",
    tag = "Pairs",
    summary = "Get pair details",
    description = "Returns the full pair including both sides' headers and bodies.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pair UUID"),
    ),
    responses(
        (status = 200, description = "Pair details", body = serde_json::Value),
        (status = 404, description = "Pair not found", body = ErrorResponse),
    )
)]
pub async fn get_pair(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, RelayError> {
    let pair = state.relay_service.get_pair(PairId::from_uuid(id)).await?;
    Ok(Json(pair))
}

/// `POST /pairs/:id/compare` — Diff a pair's two sides.
///
/// # Errors
///
/// Returns [`RelayError::PairNotFound`] if the ID is unknown.
#[utoipa::path(
    post,
    path = "/api/v1/pairs/{id}/compare",
    tag = "Pairs",
    summary = "Compare a pair",
    description = "Diffs the pair's headers and bodies through the ignore list, compares transport metadata, and marks the pair compared.",
    params(
        ("id" = uuid::Uuid, Path, description = "Pair UUID"),
    ),
    responses(
        (status = 200, description = "Comparison report", body = ComparisonResponse),
        (status = 404, description = "Pair not found", body = ErrorResponse),
    )
)]
pub async fn compare_pair(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, RelayError> {
    let result = state
        .relay_service
        .compare_pair(PairId::from_uuid(id))
        .await?;
    Ok(Json(ComparisonResponse::from(result)))
}

/// `DELETE /pairs` — Destroy all pairs and start a new pairing epoch.
#[utoipa::path(
    delete,
    path = "/api/v1/pairs",
    tag = "Pairs",
    summary = "Clear pairs",
    description = "Destroys all pairs and resets paired flags on retained messages. Pending entries and stored records survive.",
    responses(
        (status = 200, description = "Pairs cleared", body = ClearedResponse),
    )
)]
pub async fn clear_pairs(State(state): State<AppState>) -> impl IntoResponse {
    state.relay_service.clear_pairs().await;
    Json(ClearedResponse {
        cleared: "pairs".to_string(),
        message: "all pairs destroyed; retained messages may pair again".to_string(),
    })
}

/// Pair resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pairs", get(list_pairs).delete(clear_pairs))
        .route("/pairs/{id}", get(get_pair))
        .route("/pairs/{id}/compare", post(compare_pair))
}
