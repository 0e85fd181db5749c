//! Correlation record handlers over the persistence store.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ClearedResponse, RecordListResponse, RecordSummaryDto};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// `GET /records` — List stored correlation records.
///
/// # Errors
///
/// Returns [`RelayError::StoreUnavailable`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/records",
    tag = "Records",
    summary = "List correlation records",
    description = "Returns every live captured request/response record, most recent first.",
    responses(
        (status = 200, description = "Record list", body = RecordListResponse),
        (status = 500, description = "Store unavailable", body = ErrorResponse),
    )
)]
pub async fn list_records(State(state): State<AppState>) -> Result<impl IntoResponse, RelayError> {
    let records = state.relay_service.list_records().await?;
    let data: Vec<RecordSummaryDto> = records.iter().map(RecordSummaryDto::from).collect();
    let total = data.len();
    Ok(Json(RecordListResponse { data, total }))
}

/// `GET /records/:id` — Get one stored record in full.
///
/// # Errors
///
/// Returns [`RelayError::RecordNotFound`] if absent or expired.
#[utoipa::path(
    get,
    path = "/api/v1/records/{id}",
    tag = "Records",
    summary = "Get a correlation record",
    description = "Returns the full captured request and response stored under the given correlation ID.",
    params(
        ("id" = String, Path, description = "Correlation ID"),
    ),
    responses(
        (status = 200, description = "Record details", body = serde_json::Value),
        (status = 404, description = "Record not found", body = ErrorResponse),
    )
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, RelayError> {
    let record = state.relay_service.get_record(&id).await?;
    Ok(Json(record))
}

/// `DELETE /records/:id` — Remove one stored record.
///
/// # Errors
///
/// Returns [`RelayError::RecordNotFound`] if absent or expired.
#[utoipa::path(
    delete,
    path = "/api/v1/records/{id}",
    tag = "Records",
    summary = "Delete a correlation record",
    description = "Removes the record stored under the given correlation ID.",
    params(
        ("id" = String, Path, description = "Correlation ID"),
    ),
    responses(
        (status = 200, description = "Record removed", body = ClearedResponse),
        (status = 404, description = "Record not found", body = ErrorResponse),
    )
)]
pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, RelayError> {
    state.relay_service.remove_record(&id).await?;
    Ok(Json(ClearedResponse {
        cleared: "record".to_string(),
        message: format!("record {id} removed"),
    }))
}

/// Record resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/records", get(list_records))
        .route("/records/{id}", get(get_record).delete(delete_record))
}
