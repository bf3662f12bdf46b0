//! YouTube Metadata Service - Main Application Entry Point
//!
//! REST API server that resolves YouTube video metadata behind per-caller
//! API keys with hourly quotas, plus an operator-only surface for issuing
//! and revoking those keys.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: composite API keys (`yt_<keyId>_<secret>`), only
//!   the SHA-256 digest of the secret half ever persisted
//! - **Quota**: rolling 60-minute window over per-request usage rows
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations
//! 3. Build the router: public, key-required, and admin route groups
//! 4. Start server on the configured port

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;
mod store;
#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use crate::{
    middleware::admin::AdminGuard,
    services::metadata_service::OembedFetcher,
    state::AppState,
    store::PgKeyStore,
};

/// Assemble the full route tree over the given state.
///
/// Three groups, each with its own gate:
/// - `/api/video-info`: optional auth (UI-facing, anonymous allowed)
/// - `/api/v1/video-info`: API key required
/// - `/api/v1/admin/*`: operator token required, checked before any
///   key-auth logic is ever reached
pub(crate) fn build_router(state: AppState) -> Router {
    let required_routes = Router::new()
        .route("/api/v1/video-info", post(handlers::videos::video_info))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_api_key,
        ));

    // The public route still evaluates credentials when present, so an
    // exhausted key cannot dodge its quota by pretending to be anonymous
    let public_routes = Router::new()
        .route("/api/video-info", post(handlers::videos::video_info))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::optional_api_key,
        ))
        .layer(CorsLayer::permissive());

    let admin_routes = Router::new()
        .route(
            "/api/v1/admin/keys",
            post(handlers::admin_keys::create_key).get(handlers::admin_keys::list_keys),
        )
        .route(
            "/api/v1/admin/keys/{id}",
            patch(handlers::admin_keys::update_key).delete(handlers::admin_keys::delete_key),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::admin::require_admin,
        ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(required_routes)
        .merge(public_routes)
        .merge(admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    if config.admin_token.is_none() {
        // The admin surface fails closed until this is fixed
        tracing::error!("ADMIN_TOKEN is not set; admin endpoints will reject every request");
    }

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let state = AppState {
        store: Arc::new(PgKeyStore::new(pool)),
        admin: Arc::new(AdminGuard::new(config.admin_token.clone())),
        fetcher: Arc::new(OembedFetcher::new()?),
    };

    let app = build_router(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    axum::serve(listener, app).await?;

    Ok(())
}
