//! HTTP server layer
//!
//! Axum server with:
//! - JSON error envelope for every failure
//! - Request tracing and per-request timeout
//! - Graceful shutdown

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerError};
