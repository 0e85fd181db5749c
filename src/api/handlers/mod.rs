//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod ingest;
pub mod pairs;
pub mod records;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(pairs::routes())
        .merge(records::routes())
        .merge(admin::routes())
}
