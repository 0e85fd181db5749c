//! Ingestion handler: the single endpoint both systems post their
//! traffic to.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use crate::api::dto::IngestAckResponse;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};
use crate::service::{IngestOutcome, WaitOutcome};

/// Headers never copied from a stored response onto the outgoing one.
/// Hop-by-hop and framing headers belong to this exchange, not the
/// captured one.
const UNRELAYED_HEADERS: &[&str] = &[
    "connection",
    "content-length",
    "content-type",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
];

/// `POST /receive` — Ingest one message from either system.
///
/// Most messages are acknowledged immediately. A payment request from
/// the connector service suspends until its captured counterpart
/// response arrives, then relays that response's status, headers, and
/// body.
///
/// # Errors
///
/// Returns [`RelayError::MalformedEnvelope`] for undecodable capture
/// envelopes, [`RelayError::WaitTimeout`] when no counterpart arrives
/// in time, and [`RelayError::CorrelationMismatch`] when a stored
/// response fails validation.
#[utoipa::path(
    post,
    path = "/receive",
    tag = "Ingestion",
    summary = "Ingest a message",
    description = "Accepts any body from either system (JSON or raw text), classifies it, and runs the pairing check. Connector-side payment requests block until the captured gateway response is available and relay it back.",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Message acknowledged or counterpart relayed", body = IngestAckResponse),
        (status = 400, description = "Malformed capture envelope", body = ErrorResponse),
        (status = 408, description = "Timed out waiting for the counterpart", body = ErrorResponse),
        (status = 500, description = "Store failure or correlation mismatch", body = ErrorResponse),
    )
)]
pub async fn receive(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    raw_body: Bytes,
) -> Result<impl IntoResponse, RelayError> {
    let headers = lower_headers(&headers);
    let body = parse_body(&raw_body);
    let outcome = state
        .relay_service
        .ingest(method.as_str(), "/receive", headers, body)
        .await?;

    match outcome {
        IngestOutcome::Acknowledged(summary) => {
            Ok((StatusCode::OK, Json(IngestAckResponse::from(summary))).into_response())
        }
        IngestOutcome::AwaitCounterpart { correlation_id, .. } => {
            match state.relay_service.waiter().wait(&correlation_id).await {
                WaitOutcome::Delivered {
                    status_code,
                    headers,
                    body,
                } => {
                    let status = StatusCode::from_u16(status_code)
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                    let mut response = (status, Json(body)).into_response();
                    relay_stored_headers(&mut response, &headers);
                    Ok(response)
                }
                WaitOutcome::Mismatch => Err(RelayError::CorrelationMismatch(correlation_id)),
                WaitOutcome::Timeout => Err(RelayError::WaitTimeout(correlation_id)),
                WaitOutcome::StoreError(message) => Err(RelayError::StoreUnavailable(message)),
            }
        }
    }
}

/// Interprets an inbound body: JSON when it parses, the raw text as a
/// JSON string otherwise, null when empty. Non-JSON traffic must still
/// be classified and retained.
fn parse_body(raw: &[u8]) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(raw)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(raw).into_owned()))
}

/// Lowers an Axum header map into the owned, lowercase-keyed form the
/// classifier works with. Non-UTF-8 values are skipped.
fn lower_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect()
}

/// Copies a stored response's headers onto the outgoing response,
/// skipping hop-by-hop and framing headers. Names or values that are
/// not valid HTTP header tokens are skipped.
fn relay_stored_headers(response: &mut Response, stored: &HashMap<String, String>) {
    for (name, value) in stored {
        if UNRELAYED_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h)) {
            continue;
        }
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::from_str(value),
        ) {
            response.headers_mut().insert(name, value);
        }
    }
}

/// Ingestion route, mounted at the router root.
pub fn routes() -> Router<AppState> {
    Router::new().route("/receive", post(receive))
}
