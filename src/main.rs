//! Widget Gate - Main Application Entry Point
//!
//! This is the admission-control service for embeddable contractor
//! calculator widgets. On every third-party page load it decides whether a
//! widget may render, gated on key validity, subscription status, domain
//! binding, and rate limits. It also issues widget keys, captures leads
//! submitted by validated widgets, and serves the client-side embed loader.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: contractor API key with SHA-256 hashing
//!   (management endpoints only; widget endpoints are public by design)
//! - **Format**: JSON requests/responses, plus the embed.js asset
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;

use tracing_subscriber::EnvFilter;

use axum::{
    Router,
    http::Method,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: db::DbPool,
    pub config: config::Config,
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

    // Create database pool
    let pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let state = AppState {
        pool,
        config: config.clone(),
    };

    // Widget endpoints are called from arbitrary third-party origins -
    // embedding on customer-owned sites is the entire point - so CORS is
    // wide open here, including preflight OPTIONS.
    let widget_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    // Public widget routes (no authentication; gated by the widget key)
    let widget_routes = Router::new()
        .route("/widget-validate", post(handlers::validate::validate_widget))
        .route(
            "/widget-lead-capture",
            post(handlers::leads::capture_lead),
        )
        .route("/embed.js", get(handlers::embed::embed_script))
        .layer(widget_cors);

    // Key management routes (contractor API key required)
    let authenticated_routes = Router::new()
        .route("/widget-key-generate", post(handlers::keys::generate_key))
        .route("/widget-keys", get(handlers::keys::list_keys))
        .route(
            "/widget-keys/{id}/deactivate",
            post(handlers::keys::deactivate_key),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ));

    // Combine widget routes with management and monitoring routes
    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .merge(widget_routes)
        .merge(authenticated_routes)
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share state with all handlers via State extraction
        .with_state(state);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
