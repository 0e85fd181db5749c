//! parity-relay server entry point.
//!
//! Starts the Axum HTTP server with the ingestion and management
//! endpoints.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use parity_relay::api;
use parity_relay::app_state::AppState;
use parity_relay::config::RelayConfig;
use parity_relay::persistence::{
    CorrelationStore, InMemoryCorrelationStore, PostgresCorrelationStore,
};
use parity_relay::service::RelayService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RelayConfig::from_env().context("loading configuration")?;
    tracing::info!(addr = %config.listen_addr, "starting parity-relay");

    // Select the correlation store backend
    let store: Arc<dyn CorrelationStore> = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(std::time::Duration::from_secs(
                config.database_connect_timeout_secs,
            ))
            .connect(&config.database_url)
            .await
            .context("connecting to postgres")?;
        let store =
            PostgresCorrelationStore::new(pool, config.store_key_prefix.clone(), config.store_ttl);
        store
            .ensure_schema()
            .await
            .context("creating correlation_records table")?;
        tracing::info!("correlation store: postgres");
        Arc::new(store)
    } else {
        tracing::info!("correlation store: in-memory");
        Arc::new(InMemoryCorrelationStore::new(config.store_ttl))
    };

    // Build service layer
    let relay_service = Arc::new(RelayService::new(&config, store));

    // Build application state
    let app_state = AppState { relay_service };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await.context("serving")?;

    Ok(())
}
