//! reviewctl-server: code-review assignment service
//!
//! Stores teams, users and pull requests, assigns reviewers on PR
//! creation and swaps them on request. Exposed over a small JSON API.

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod service;

pub use config::{AppConfig, DatabaseSettings, ServerSettings};
pub use error::{ReviewError, ReviewResult};
pub use http::{build_router, run_server, AppState};
pub use service::ReviewService;
