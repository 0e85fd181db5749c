//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Ingestion and health live at the router root; management endpoints
//! are mounted under `/api/v1`.

pub mod dto;
pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete router with ingestion and management endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::ingest::routes())
        .merge(handlers::system::routes())
}
