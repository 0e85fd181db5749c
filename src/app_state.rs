//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::RelayService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay service for all pairing and comparison logic.
    pub relay_service: Arc<RelayService>,
}
