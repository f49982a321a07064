//! Axum server setup
//!
//! Router with:
//! - Tracing and request timeout middleware
//! - Optional permissive CORS
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::sync::Arc;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::middleware::request_timeout;
use super::routes;
use crate::config::{ConfigError, ServerSettings};
use crate::service::ReviewService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: ReviewService,
}

impl AppState {
    pub fn new(service: ReviewService) -> Self {
        Self { service }
    }
}

/// Build the application router with all routes.
pub fn build_router(state: AppState, settings: &ServerSettings) -> Router {
    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::teams::router())
        .merge(routes::users::router())
        .merge(routes::pull_requests::router())
        .layer(middleware::from_fn_with_state(
            settings.request_timeout(),
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state));

    if settings.cors_permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Run the HTTP server until a shutdown signal arrives.
///
/// # Example
///
/// ```ignore
/// let service = ReviewService::new(store, AssignmentEngine::from_clock());
/// run_server(AppState::new(service), &ServerSettings::default()).await?;
/// ```
pub async fn run_server(state: AppState, settings: &ServerSettings) -> Result<(), ServerError> {
    let addr = settings.bind_addr().await?;
    let app = build_router(state, settings);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
