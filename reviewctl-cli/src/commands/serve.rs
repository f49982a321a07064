//! HTTP server command

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use reviewctl_core::AssignmentEngine;
use reviewctl_server::db::{create_pool, migrations, MemoryStore, PgStore, ReviewStore};
use reviewctl_server::{run_server, AppConfig, AppState, ReviewService};

use super::ConfigArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Host to bind to (default: 0.0.0.0, or SERVER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (default: 8080, or SERVER_PORT)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Keep everything in memory instead of PostgreSQL (lost on exit)
    #[arg(long)]
    pub memory: bool,

    /// Do not create the schema on startup
    #[arg(long)]
    pub skip_migrations: bool,
}

impl ServeArgs {
    fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = self.config.load()?;
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.cors_permissive {
            config.server.cors_permissive = true;
        }
        Ok(config)
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = args.resolve_config()?;

    let store: Arc<dyn ReviewStore> = if args.memory {
        tracing::warn!("Using in-memory storage - all data is lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        let pool = create_pool(&config.database)
            .await
            .context("Failed to create database pool")?;

        if !args.skip_migrations {
            migrations::run(&pool)
                .await
                .context("Failed to apply schema")?;
        }
        Arc::new(PgStore::new(pool))
    };

    let service = ReviewService::new(store, AssignmentEngine::from_clock());

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Starting reviewctl server"
    );

    // Blocks until shutdown
    run_server(AppState::new(service), &config.server)
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_loaded_config() {
        let args = ServeArgs {
            config: ConfigArgs {
                config: None,
                database_url: Some("postgres://localhost/reviews".into()),
            },
            host: Some("127.0.0.1".into()),
            port: Some(3030),
            cors_permissive: true,
            memory: false,
            skip_migrations: false,
        };

        let config = args.resolve_config().unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3030);
        assert!(config.server.cors_permissive);
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgres://localhost/reviews")
        );
    }
}
